pub mod matricules;
pub mod students;
pub mod users;
