// SPDX-License-Identifier: GPL-3.0-only
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::binder::binder::FavoritesBinder;
use crate::binder::traits::{ButtonAppearance, FavoriteControl, FavoritesView};
use crate::registry::models::PlaceId;

#[derive(Debug, Default)]
struct ControlState {
    disabled: bool,
    times_disabled: usize,
    appearance: Option<ButtonAppearance>,
    dismissed: bool,
}

/// A favorite button drawn as one line of terminal output
#[derive(Debug)]
pub struct TerminalControl {
    place_id: String,
    remove_mode: bool,
    echo: bool,
    state: Mutex<ControlState>,
}

impl TerminalControl {
    pub fn new(place_id: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            remove_mode: false,
            echo: false,
            state: Mutex::default(),
        }
    }

    /// A button from the favorites page, which removes instead of toggling
    pub fn remover(place_id: impl Into<String>) -> Self {
        Self {
            remove_mode: true,
            ..Self::new(place_id)
        }
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn is_dismissed(&self) -> bool {
        self.lock().dismissed
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
impl TerminalControl {
    pub fn appearance(&self) -> Option<ButtonAppearance> {
        self.lock().appearance
    }

    pub fn is_disabled(&self) -> bool {
        self.lock().disabled
    }

    pub fn times_disabled(&self) -> usize {
        self.lock().times_disabled
    }
}

impl FavoriteControl for TerminalControl {
    fn place_id(&self) -> Option<String> {
        Some(self.place_id.clone())
    }

    fn remove_mode(&self) -> bool {
        self.remove_mode
    }

    fn set_disabled(&self, disabled: bool) {
        let mut state = self.lock();
        if disabled && !state.disabled {
            state.times_disabled += 1;
        }
        state.disabled = disabled;
    }

    fn render(&self, appearance: ButtonAppearance) {
        let changed = {
            let mut state = self.lock();
            let changed = state.appearance != Some(appearance);
            state.appearance = Some(appearance);
            changed
        };

        // Full refreshes redraw every button; only print the ones that changed
        if self.echo && changed {
            println!("{}", describe(&self.place_id, appearance));
        }
    }

    fn dismiss(&self) {
        self.lock().dismissed = true;
        if self.echo {
            println!("  place {} removed from the list", self.place_id);
        }
    }
}

/// One output line for a button: mark, place, title, then icon and classes
fn describe(place_id: &str, appearance: ButtonAppearance) -> String {
    let mark = if appearance.favorited { '♥' } else { '♡' };
    let classes = match appearance.css_class() {
        Some(class) => format!("{} {}", appearance.icon, class),
        None => appearance.icon.to_string(),
    };
    format!("{} place {}: {} [{}]", mark, place_id, appearance.title, classes)
}

/// Terminal rendition of a page holding favorite buttons
pub struct TerminalView {
    controls: Vec<Arc<TerminalControl>>,
    authenticated: bool,
    echo: bool,
    badge: Mutex<Option<usize>>,
    place_counts: Mutex<HashMap<PlaceId, u64>>,
    empty_state_shown: AtomicBool,
}

impl TerminalView {
    /// One toggle button per place id, printing every change when `echo` is set
    pub fn new(
        place_ids: impl IntoIterator<Item = String>,
        authenticated: bool,
        echo: bool,
    ) -> Self {
        Self::with_buttons(place_ids.into_iter().map(TerminalControl::new), authenticated, echo)
    }

    /// The favorites page: one remove button per place id
    pub fn favorites_page(
        place_ids: impl IntoIterator<Item = String>,
        authenticated: bool,
        echo: bool,
    ) -> Self {
        Self::with_buttons(place_ids.into_iter().map(TerminalControl::remover), authenticated, echo)
    }

    fn with_buttons(
        controls: impl Iterator<Item = TerminalControl>,
        authenticated: bool,
        echo: bool,
    ) -> Self {
        let controls = controls.map(|c| Arc::new(c.with_echo(echo))).collect();
        Self::build(controls, authenticated, echo)
    }

    fn build(controls: Vec<Arc<TerminalControl>>, authenticated: bool, echo: bool) -> Self {
        Self {
            controls,
            authenticated,
            echo,
            badge: Mutex::new(None),
            place_counts: Mutex::default(),
            empty_state_shown: AtomicBool::new(false),
        }
    }

    pub fn control(&self, index: usize) -> Option<Arc<TerminalControl>> {
        self.controls.get(index).cloned()
    }

    /// The button still on the page that shows `place_id`
    pub fn find(&self, place_id: &str) -> Option<Arc<TerminalControl>> {
        let place_id = place_id.trim();
        self.controls
            .iter()
            .find(|c| !c.is_dismissed() && c.place_id.trim() == place_id)
            .cloned()
    }
}

#[cfg(test)]
impl TerminalView {
    /// Silent view over prepared controls
    pub fn from_controls(controls: Vec<Arc<TerminalControl>>, authenticated: bool) -> Self {
        Self::build(controls, authenticated, false)
    }

    pub fn badge(&self) -> Option<usize> {
        *self.badge.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed the counter the server rendered for `id`
    pub fn set_place_count(&self, id: PlaceId, count: u64) {
        self.place_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, count);
    }

    pub fn place_count(&self, id: PlaceId) -> u64 {
        self.place_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or(0)
    }

    pub fn empty_state_shown(&self) -> bool {
        self.empty_state_shown.load(Ordering::SeqCst)
    }
}

impl FavoritesView for TerminalView {
    fn controls(&self) -> Vec<Arc<dyn FavoriteControl>> {
        self.controls
            .iter()
            .filter(|c| !c.is_dismissed())
            .map(|c| Arc::clone(c) as Arc<dyn FavoriteControl>)
            .collect()
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn set_total_badge(&self, count: Option<usize>) {
        *self.badge.lock().unwrap_or_else(PoisonError::into_inner) = count;
        if self.echo {
            match count {
                Some(count) => println!("favorites: {}", count),
                None => println!("favorites: none"),
            }
        }
    }

    fn adjust_place_count(&self, id: PlaceId, delta: i64) {
        let mut counts = self.place_counts.lock().unwrap_or_else(PoisonError::into_inner);
        let count = counts.entry(id).or_insert(0);
        *count = count.saturating_add_signed(delta);
    }

    fn show_empty_state(&self) {
        self.empty_state_shown.store(true, Ordering::SeqCst);
        if self.echo {
            println!("no favorites left");
        }
    }
}

/// Press the button showing `place_id`. Returns the pending backend
/// notification, if one was started.
pub fn click(
    binder: &FavoritesBinder,
    view: &TerminalView,
    place_id: &str,
) -> Option<JoinHandle<()>> {
    match view.find(place_id) {
        Some(control) => binder.dispatch(&*control),
        None => {
            warn!(place_id = %place_id.trim(), "No favorite button for this place on the page");
            None
        }
    }
}

/// Treat every line received as a click on the button it names, until the
/// sender closes. Blank lines are skipped. Returns how many clicks were handled.
pub async fn run_clicks(
    binder: &FavoritesBinder,
    view: &TerminalView,
    mut clicks: mpsc::Receiver<String>,
) -> usize {
    let mut handled = 0;

    while let Some(line) = clicks.recv().await {
        if line.trim().is_empty() {
            continue;
        }
        debug!(input = %line.trim(), "Button pressed");
        // Backend notifications run on their own; the next click does not wait
        let _ = click(binder, view, &line);
        handled += 1;
    }

    info!(handled, "Stopped reading button presses");
    handled
}

/// Lines typed on stdin, read on a dedicated thread so the blocking read
/// never holds up runtime shutdown
pub fn spawn_stdin_clicks() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);

    thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    rx
}
