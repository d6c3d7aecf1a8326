// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod chart;     // Écran historique (graphique ligne)
pub mod dashboard; // Cadre commun + écran Dashboard
pub mod events;    // Gestion des événements clavier
pub mod exchanges; // Écran liste des exchanges

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
