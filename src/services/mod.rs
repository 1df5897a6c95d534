pub mod playlist;
pub mod relay;
