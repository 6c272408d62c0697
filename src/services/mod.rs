pub mod materials;
pub mod products;
pub mod productions;
pub mod recipes;
