pub mod avanza;
pub mod util;
