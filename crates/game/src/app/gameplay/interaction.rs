use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use tracing::info;

use super::grid::MapRect;

/// Scene-scoped "a dialogue is open" flag shared between the interaction
/// coordinator and the movement controller.
#[derive(Debug, Clone, Default)]
pub(crate) struct DialogueGate {
    open: Rc<Cell<bool>>,
}

impl DialogueGate {
    pub(crate) fn is_open(&self) -> bool {
        self.open.get()
    }

    pub(crate) fn open(&self) {
        self.open.set(true);
    }

    pub(crate) fn release(&self) {
        self.open.set(false);
    }
}

pub(crate) type CloseCallback = Box<dyn FnOnce()>;

pub(crate) trait DialogueService {
    fn is_dialogue_open(&self) -> bool;

    /// Opens the dialogue for `zone`. `on_close` runs exactly once when it
    /// closes. Returns false, dropping `on_close` unrun, when the request is refused.
    fn request_open(&mut self, zone: &str, on_close: CloseCallback) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfirmOutcome {
    Opened,
    Refused,
    Ignored,
}

/// Tracks the zone the player is standing in and turns a confirm action into
/// a dialogue request.
#[derive(Debug, Default)]
pub(crate) struct InteractionCoordinator {
    gate: DialogueGate,
    current_zone: Option<String>,
    hint_visible: bool,
}

impl InteractionCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Handle to the gate this coordinator sets while a dialogue is open.
    pub(crate) fn gate(&self) -> DialogueGate {
        self.gate.clone()
    }

    pub(crate) fn current_zone(&self) -> Option<&str> {
        self.current_zone.as_deref()
    }

    pub(crate) fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    pub(crate) fn on_collide_zone(&mut self, zone: &str, dialogs: &dyn DialogueService) {
        self.current_zone = Some(zone.to_string());
        if !dialogs.is_dialogue_open() {
            self.hint_visible = true;
        }
    }

    pub(crate) fn on_collide_zone_end(&mut self, zone: &str) {
        if self.current_zone.as_deref() == Some(zone) {
            self.current_zone = None;
            self.hint_visible = false;
        }
    }

    pub(crate) fn confirm(&mut self, dialogs: &mut dyn DialogueService) -> ConfirmOutcome {
        let Some(zone) = self.current_zone.clone() else {
            return ConfirmOutcome::Ignored;
        };
        if dialogs.is_dialogue_open() || self.gate.is_open() {
            return ConfirmOutcome::Ignored;
        }

        self.hint_visible = false;
        self.gate.open();
        let gate = self.gate.clone();
        if dialogs.request_open(&zone, Box::new(move || gate.release())) {
            ConfirmOutcome::Opened
        } else {
            self.gate.release();
            self.hint_visible = true;
            info!(zone = zone.as_str(), "dialog_refused");
            ConfirmOutcome::Refused
        }
    }
}

/// Named interactive area in world units.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct InteractiveZone {
    pub(crate) name: String,
    pub(crate) bounds: MapRect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ZoneEvent {
    Entered(String),
    Left(String),
}

/// Turns per-tick overlap between the player footprint and the zones into
/// enter and leave events. Zones sharing a name count as one zone.
#[derive(Debug, Clone, Default)]
pub(crate) struct ZoneTracker {
    zones: Vec<InteractiveZone>,
    contact_margin: f32,
    touching: BTreeSet<String>,
}

impl ZoneTracker {
    pub(crate) fn new(zones: Vec<InteractiveZone>, contact_margin: f32) -> Self {
        Self {
            zones,
            contact_margin: contact_margin.max(0.0),
            touching: BTreeSet::new(),
        }
    }

    pub(crate) fn zones(&self) -> &[InteractiveZone] {
        &self.zones
    }

    pub(crate) fn is_touching(&self, zone: &str) -> bool {
        self.touching.contains(zone)
    }

    /// Events since the previous call, leaves before enters.
    pub(crate) fn update(&mut self, body: &MapRect) -> Vec<ZoneEvent> {
        let now: BTreeSet<String> = self
            .zones
            .iter()
            .filter(|zone| zone.bounds.inflate(self.contact_margin).overlaps(body))
            .map(|zone| zone.name.clone())
            .collect();

        let mut events: Vec<ZoneEvent> = self
            .touching
            .difference(&now)
            .cloned()
            .map(ZoneEvent::Left)
            .collect();
        events.extend(
            now.difference(&self.touching)
                .cloned()
                .map(ZoneEvent::Entered),
        );
        self.touching = now;
        events
    }

    pub(crate) fn reset(&mut self) {
        self.touching.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Dialogue service that records requests and lets tests close the dialogue.
    #[derive(Default)]
    struct FakeDialogs {
        open_zone: Option<String>,
        on_close: Option<CloseCallback>,
        known: Vec<&'static str>,
        requests: Rc<RefCell<Vec<String>>>,
    }

    impl FakeDialogs {
        fn knowing(zones: &[&'static str]) -> Self {
            Self {
                known: zones.to_vec(),
                ..Self::default()
            }
        }

        fn close(&mut self) {
            self.open_zone = None;
            if let Some(callback) = self.on_close.take() {
                callback();
            }
        }
    }

    impl DialogueService for FakeDialogs {
        fn is_dialogue_open(&self) -> bool {
            self.open_zone.is_some()
        }

        fn request_open(&mut self, zone: &str, on_close: CloseCallback) -> bool {
            self.requests.borrow_mut().push(zone.to_string());
            if self.open_zone.is_some() || !self.known.iter().any(|known| *known == zone) {
                return false;
            }
            self.open_zone = Some(zone.to_string());
            self.on_close = Some(on_close);
            true
        }
    }

    fn zone(name: &str, x: f32, y: f32) -> InteractiveZone {
        InteractiveZone {
            name: name.to_string(),
            bounds: MapRect::new(x, y, 10.0, 10.0),
        }
    }

    #[test]
    fn entering_zone_shows_hint_unless_dialog_open() {
        let mut dialogs = FakeDialogs::knowing(&["pc", "tv"]);
        let mut coordinator = InteractionCoordinator::new();
        coordinator.on_collide_zone("pc", &dialogs);
        assert_eq!(coordinator.current_zone(), Some("pc"));
        assert!(coordinator.hint_visible());

        assert_eq!(coordinator.confirm(&mut dialogs), ConfirmOutcome::Opened);
        coordinator.on_collide_zone("tv", &dialogs);
        assert_eq!(coordinator.current_zone(), Some("tv"));
        assert!(!coordinator.hint_visible());
    }

    #[test]
    fn leaving_other_zone_keeps_current() {
        let dialogs = FakeDialogs::default();
        let mut coordinator = InteractionCoordinator::new();
        coordinator.on_collide_zone("pc", &dialogs);
        coordinator.on_collide_zone_end("bed");
        assert_eq!(coordinator.current_zone(), Some("pc"));
        assert!(coordinator.hint_visible());

        coordinator.on_collide_zone_end("pc");
        assert_eq!(coordinator.current_zone(), None);
        assert!(!coordinator.hint_visible());
    }

    #[test]
    fn confirm_sets_gate_until_dialog_closes() {
        let mut dialogs = FakeDialogs::knowing(&["resume"]);
        let mut coordinator = InteractionCoordinator::new();
        let gate = coordinator.gate();
        coordinator.on_collide_zone("resume", &dialogs);

        assert_eq!(coordinator.confirm(&mut dialogs), ConfirmOutcome::Opened);
        assert!(gate.is_open());
        assert!(!coordinator.hint_visible());

        dialogs.close();
        assert!(!gate.is_open());
    }

    #[test]
    fn confirm_while_in_dialogue_is_ignored() {
        let mut dialogs = FakeDialogs::knowing(&["pc"]);
        let requests = Rc::clone(&dialogs.requests);
        let mut coordinator = InteractionCoordinator::new();
        coordinator.on_collide_zone("pc", &dialogs);

        coordinator.confirm(&mut dialogs);
        assert_eq!(coordinator.confirm(&mut dialogs), ConfirmOutcome::Ignored);
        assert_eq!(requests.borrow().len(), 1);
    }

    #[test]
    fn confirm_without_zone_is_ignored() {
        let mut dialogs = FakeDialogs::knowing(&["pc"]);
        let mut coordinator = InteractionCoordinator::new();
        assert_eq!(coordinator.confirm(&mut dialogs), ConfirmOutcome::Ignored);
        assert!(!coordinator.gate().is_open());
    }

    #[test]
    fn refused_request_releases_gate_and_restores_hint() {
        let mut dialogs = FakeDialogs::knowing(&[]);
        let mut coordinator = InteractionCoordinator::new();
        coordinator.on_collide_zone("mystery", &dialogs);
        assert_eq!(coordinator.confirm(&mut dialogs), ConfirmOutcome::Refused);
        assert!(!coordinator.gate().is_open());
        assert!(coordinator.hint_visible());
    }

    #[test]
    fn gates_of_separate_coordinators_are_independent() {
        let first = InteractionCoordinator::new();
        let second = InteractionCoordinator::new();
        first.gate().open();
        assert!(!second.gate().is_open());
    }

    #[test]
    fn tracker_reports_leaves_before_enters() {
        let mut tracker = ZoneTracker::new(vec![zone("pc", 0.0, 0.0), zone("tv", 30.0, 0.0)], 0.0);
        let body_at = |x: f32| MapRect::new(x, 0.0, 4.0, 4.0);

        assert_eq!(tracker.update(&body_at(2.0)), vec![ZoneEvent::Entered("pc".to_string())]);
        assert!(tracker.update(&body_at(3.0)).is_empty());
        assert_eq!(
            tracker.update(&body_at(32.0)),
            vec![
                ZoneEvent::Left("pc".to_string()),
                ZoneEvent::Entered("tv".to_string())
            ]
        );
        assert!(tracker.is_touching("tv"));
    }

    #[test]
    fn tracker_margin_extends_contact() {
        let mut tracker = ZoneTracker::new(vec![zone("bed", 0.0, 0.0)], 5.0);
        let body = MapRect::new(12.0, 0.0, 4.0, 4.0);
        assert_eq!(tracker.update(&body), vec![ZoneEvent::Entered("bed".to_string())]);

        let mut tight = ZoneTracker::new(vec![zone("bed", 0.0, 0.0)], 0.0);
        assert!(tight.update(&body).is_empty());
    }

    #[test]
    fn zones_sharing_a_name_act_as_one() {
        let mut tracker = ZoneTracker::new(
            vec![zone("library", 0.0, 0.0), zone("library", 8.0, 0.0)],
            0.0,
        );
        assert_eq!(
            tracker.update(&MapRect::new(2.0, 2.0, 2.0, 2.0)),
            vec![ZoneEvent::Entered("library".to_string())]
        );
        assert!(tracker.update(&MapRect::new(12.0, 2.0, 2.0, 2.0)).is_empty());
        tracker.reset();
        assert!(!tracker.is_touching("library"));
    }
}
