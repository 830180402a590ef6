pub mod approve;
pub mod keygen;
pub mod reveal;
