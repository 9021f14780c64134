pub mod colors;
pub mod layout;
pub mod style;
pub mod nue_grid;
pub mod yield_scatter;
