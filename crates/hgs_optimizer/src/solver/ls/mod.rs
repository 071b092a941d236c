pub mod improve_individual;
pub mod local_search;
mod r#move;
mod relocate;
mod route_data;
mod swap;
mod two_opt;
mod two_opt_star;
