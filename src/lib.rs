pub mod network;
pub mod parsers;
pub mod topology;
