pub mod controller_builder;
pub mod power_tree;
pub mod recorders;
pub mod scripted_directory;
pub mod wait_utils;
