pub mod browse;
pub mod gendists;
pub mod match_cmd;
