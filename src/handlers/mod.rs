use std::sync::Arc;

use crate::{db::DbPool, events::EventSender};
use crate::services::{
    materials::MaterialService, products::ProductService, productions::ProductionService,
    recipes::RecipeService,
};

pub mod common;
pub mod health;
pub mod materials;
pub mod products;
pub mod productions;
pub mod recipes;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// All domain services, constructed once at startup and shared by handlers.
#[derive(Clone)]
pub struct AppServices {
    pub productions: ProductionService,
    pub recipes: RecipeService,
    pub products: ProductService,
    pub materials: MaterialService,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            productions: ProductionService::new(db.clone(), event_sender.clone()),
            recipes: RecipeService::new(db.clone(), event_sender.clone()),
            products: ProductService::new(db.clone(), event_sender.clone()),
            materials: MaterialService::new(db, event_sender),
        }
    }
}
