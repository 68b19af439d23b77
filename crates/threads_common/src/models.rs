pub mod community;
pub mod like;
pub mod thread;
pub mod user;

pub use community::Community;
pub use like::Like;
pub use thread::Thread;
pub use user::User;
