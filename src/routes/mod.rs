pub use errors::ApiError;
pub use health_check::health_check;
pub use home::home;
pub use newsletters::{
    create_newsletter, delete_newsletter, get_newsletter, list_newsletters, update_newsletter,
};
pub use users::get_user;

mod errors;
mod health_check;
mod home;
mod newsletters;
mod users;
