use crate::models::Draw;

/// Origine distante des tirages.
///
/// Les deux méthodes absorbent leurs propres erreurs (réseau, format) et
/// répondent `None` : une source indisponible ne doit jamais interrompre
/// l'analyse des données locales.
pub trait DrawSource {
    /// Dernier numéro de tirage publié.
    fn latest_round(&self) -> Option<u32>;

    /// Résultat d'un tirage donné, ou `None` s'il est indisponible.
    fn fetch_round(&self, round: u32) -> Option<Draw>;
}

impl<S: DrawSource + ?Sized> DrawSource for &S {
    fn latest_round(&self) -> Option<u32> {
        (**self).latest_round()
    }

    fn fetch_round(&self, round: u32) -> Option<Draw> {
        (**self).fetch_round(round)
    }
}
