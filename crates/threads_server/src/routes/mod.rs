use lazy_static::lazy_static;
use rocket::route::Route;
mod thread;
mod user;

lazy_static! {
    pub(crate) static ref THREAD_ROUTES: Vec<Route> = routes![
        thread::post_thread,
        thread::post_reply,
        thread::toggle_like,
        thread::remove_thread,
        thread::get_feed,
        thread::get_caller_activity,
        thread::get_thread,
    ];
    pub(crate) static ref USER_ROUTES: Vec<Route> = routes![
        user::put_user,
        user::search_users,
        user::get_user,
        user::get_user_threads,
        user::get_user_replies,
    ];
}
