// ============================================================================
// CryptoDash - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;     // Client du backend + données de démo
pub mod app;     // État de l'application
pub mod config;  // Configuration (variables d'environnement)
pub mod models;  // Structures de données
pub mod refresh; // Contrôleur de rafraîchissement des vues
pub mod ui;      // Interface utilisateur
