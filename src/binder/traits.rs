// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use crate::registry::models::PlaceId;

/// How a favorite button looks in a given state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonAppearance {
    pub favorited: bool,
    pub icon: &'static str,
    pub title: &'static str,
}

impl ButtonAppearance {
    pub const FAVORITED: Self = Self {
        favorited: true,
        icon: "bi-heart-fill",
        title: "Remover dos favoritos",
    };

    pub const NOT_FAVORITED: Self = Self {
        favorited: false,
        icon: "bi-heart",
        title: "Adicionar aos favoritos",
    };

    pub fn for_state(favorited: bool) -> Self {
        if favorited {
            Self::FAVORITED
        } else {
            Self::NOT_FAVORITED
        }
    }

    /// Extra class set on the button while favorited
    pub fn css_class(&self) -> Option<&'static str> {
        self.favorited.then_some("favorited")
    }
}

/// A favorite button on the page
pub trait FavoriteControl: Send + Sync {
    /// The place id attribute exactly as the page rendered it
    fn place_id(&self) -> Option<String>;

    /// Buttons on the favorites page remove instead of toggling
    fn remove_mode(&self) -> bool {
        false
    }

    fn set_disabled(&self, disabled: bool);

    fn render(&self, appearance: ButtonAppearance);

    /// Take the button's card off the page
    fn dismiss(&self) {}
}

/// The page the binder projects favorites onto
pub trait FavoritesView: Send + Sync {
    /// Favorite buttons currently on the page
    fn controls(&self) -> Vec<Arc<dyn FavoriteControl>>;

    fn is_authenticated(&self) -> bool;

    /// Show the total favorites badge, or hide it with `None`
    fn set_total_badge(&self, count: Option<usize>);

    /// Shift the "favorited by" counters shown for `id`, never below zero
    fn adjust_place_count(&self, id: PlaceId, delta: i64);

    /// Called when the last favorite card was removed from the page
    fn show_empty_state(&self) {}
}
