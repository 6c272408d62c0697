pub mod production_stage;

pub use production_stage::ProductionStage;
