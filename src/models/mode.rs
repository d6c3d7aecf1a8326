// ============================================================================
// Enum : ClientMode
// ============================================================================
// Indique si les données affichées viennent du backend (Live) ou du jeu de
// données de démonstration (Mock). Ne sert qu'au bandeau "demo mode".
// ============================================================================

use std::fmt;

/// Mode de fonctionnement du client pour la session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientMode {
    /// Réponses réelles du backend
    #[default]
    Live,

    /// Réponses synthétiques (backend injoignable)
    Mock,
}

impl ClientMode {
    pub fn is_mock(&self) -> bool {
        matches!(self, ClientMode::Mock)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClientMode::Live => "LIVE",
            ClientMode::Mock => "DEMO",
        }
    }
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
