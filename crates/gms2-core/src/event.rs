//! Object event taxonomy
//!
//! GMS2 stores each object event's code in a file named `<Kind>_<n>.gml`
//! inside the object's folder (`Create_0.gml`, `Alarm_3.gml`,
//! `Collision_obj_wall.gml`, ...). The ordering defined here is the order
//! events are presented in everywhere: queries, renders and exports.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

/// Highest alarm index an object can own
pub const MAX_ALARM: u8 = 11;

/// Event type identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Create,
    PreCreate,
    Destroy,
    BeginStep,
    Step,
    Alarm(u8),
    /// Collision with the named object
    Collision(String),
    Other(u32),
    Draw(u32),
    KeyPress(u32),
    KeyRelease(u32),
    Keyboard(u32),
    Mouse(u32),
    Gesture(u32),
    Trigger(u32),
    CleanUp,
    EndStep,
}

impl EventType {
    /// Parse an event file stem such as `Step_2` or `Collision_obj_wall`
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        let (kind, rest) = stem.split_once('_')?;
        if rest.is_empty() {
            return None;
        }
        let number = rest.parse::<u32>().ok();

        let event = match (kind, number) {
            ("Create", Some(0)) => EventType::Create,
            ("PreCreate", Some(0)) => EventType::PreCreate,
            ("Destroy", Some(0)) => EventType::Destroy,
            ("CleanUp", Some(0)) => EventType::CleanUp,
            ("Step", Some(0)) => EventType::Step,
            ("Step", Some(1)) => EventType::BeginStep,
            ("Step", Some(2)) => EventType::EndStep,
            ("Alarm", Some(n)) if n <= MAX_ALARM as u32 => EventType::Alarm(n as u8),
            ("Collision", _) => EventType::Collision(rest.to_string()),
            ("Other", Some(n)) => EventType::Other(n),
            ("Draw", Some(n)) => EventType::Draw(n),
            ("KeyPress", Some(n)) => EventType::KeyPress(n),
            ("KeyRelease", Some(n)) => EventType::KeyRelease(n),
            ("Keyboard", Some(n)) => EventType::Keyboard(n),
            ("Mouse", Some(n)) => EventType::Mouse(n),
            ("Gesture", Some(n)) => EventType::Gesture(n),
            ("Trigger", Some(n)) => EventType::Trigger(n),
            _ => return None,
        };
        Some(event)
    }

    /// File stem GMS2 uses for this event
    pub fn file_stem(&self) -> String {
        match self {
            EventType::Create => "Create_0".into(),
            EventType::PreCreate => "PreCreate_0".into(),
            EventType::Destroy => "Destroy_0".into(),
            EventType::CleanUp => "CleanUp_0".into(),
            EventType::Step => "Step_0".into(),
            EventType::BeginStep => "Step_1".into(),
            EventType::EndStep => "Step_2".into(),
            EventType::Alarm(n) => format!("Alarm_{}", n),
            EventType::Collision(target) => format!("Collision_{}", target),
            EventType::Other(n) => format!("Other_{}", n),
            EventType::Draw(n) => format!("Draw_{}", n),
            EventType::KeyPress(n) => format!("KeyPress_{}", n),
            EventType::KeyRelease(n) => format!("KeyRelease_{}", n),
            EventType::Keyboard(n) => format!("Keyboard_{}", n),
            EventType::Mouse(n) => format!("Mouse_{}", n),
            EventType::Gesture(n) => format!("Gesture_{}", n),
            EventType::Trigger(n) => format!("Trigger_{}", n),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            EventType::Create => 0,
            EventType::PreCreate => 1,
            EventType::Destroy => 2,
            EventType::BeginStep => 3,
            EventType::Step => 4,
            EventType::Alarm(_) => 5,
            EventType::Collision(_) => 6,
            EventType::Other(_) => 7,
            EventType::Draw(_) => 8,
            EventType::KeyPress(_) => 9,
            EventType::KeyRelease(_) => 10,
            EventType::Keyboard(_) => 11,
            EventType::Mouse(_) => 12,
            EventType::Gesture(_) => 13,
            EventType::Trigger(_) => 14,
            EventType::CleanUp => 15,
            EventType::EndStep => 16,
        }
    }

    fn number(&self) -> u32 {
        match self {
            EventType::Alarm(n) => *n as u32,
            EventType::Other(n)
            | EventType::Draw(n)
            | EventType::KeyPress(n)
            | EventType::KeyRelease(n)
            | EventType::Keyboard(n)
            | EventType::Mouse(n)
            | EventType::Gesture(n)
            | EventType::Trigger(n) => *n,
            _ => 0,
        }
    }

    /// Human-readable name, as the IDE labels the event
    pub fn display_name(&self) -> String {
        match self {
            EventType::Create => "Create".into(),
            EventType::PreCreate => "Pre-Create".into(),
            EventType::Destroy => "Destroy".into(),
            EventType::CleanUp => "Clean Up".into(),
            EventType::Step => "Step".into(),
            EventType::BeginStep => "Begin Step".into(),
            EventType::EndStep => "End Step".into(),
            EventType::Alarm(n) => format!("Alarm {}", n),
            EventType::Collision(target) => format!("Collision ({})", target),
            EventType::Other(n) => other_event_name(*n),
            EventType::Draw(n) => draw_event_name(*n),
            EventType::KeyPress(n) => format!("Key Press - {}", key_name(*n)),
            EventType::KeyRelease(n) => format!("Key Release - {}", key_name(*n)),
            EventType::Keyboard(n) => format!("Keyboard - {}", key_name(*n)),
            EventType::Mouse(n) => mouse_event_name(*n),
            EventType::Gesture(n) => format!("Gesture {}", n),
            EventType::Trigger(n) => format!("Trigger {}", n),
        }
    }
}

impl Ord for EventType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.number().cmp(&other.number()))
            .then_with(|| match (self, other) {
                (EventType::Collision(a), EventType::Collision(b)) => a.cmp(b),
                _ => Ordering::Equal,
            })
    }
}

impl PartialOrd for EventType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// One object event backed by a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    /// Source file, relative to the project root
    pub source: PathBuf,
}

fn draw_event_name(n: u32) -> String {
    match n {
        0 => "Draw".into(),
        64 => "Draw GUI".into(),
        65 => "Window Resize".into(),
        72 => "Draw Begin".into(),
        73 => "Draw End".into(),
        74 => "Draw GUI Begin".into(),
        75 => "Draw GUI End".into(),
        76 => "Pre-Draw".into(),
        77 => "Post-Draw".into(),
        n => format!("Draw {}", n),
    }
}

fn other_event_name(n: u32) -> String {
    match n {
        0 => "Outside Room".into(),
        1 => "Intersect Boundary".into(),
        2 => "Game Start".into(),
        3 => "Game End".into(),
        4 => "Room Start".into(),
        5 => "Room End".into(),
        7 => "Animation End".into(),
        8 => "Path Ended".into(),
        10..=25 => format!("User Event {}", n - 10),
        40..=47 => format!("Outside View {}", n - 40),
        50..=57 => format!("Intersect View {} Boundary", n - 50),
        60 => "Async - Image Loaded".into(),
        62 => "Async - HTTP".into(),
        63 => "Async - Dialog".into(),
        66 => "Async - In-App Purchase".into(),
        67 => "Async - Cloud".into(),
        68 => "Async - Networking".into(),
        69 => "Async - Steam".into(),
        70 => "Async - Social".into(),
        71 => "Async - Push Notification".into(),
        72 => "Async - Save/Load".into(),
        73 => "Async - Audio Recording".into(),
        74 => "Async - Audio Playback".into(),
        75 => "Async - System".into(),
        n => format!("Other {}", n),
    }
}

fn mouse_event_name(n: u32) -> String {
    match n {
        0 => "Left Down".into(),
        1 => "Right Down".into(),
        2 => "Middle Down".into(),
        3 => "No Button".into(),
        4 => "Left Pressed".into(),
        5 => "Right Pressed".into(),
        6 => "Middle Pressed".into(),
        7 => "Left Released".into(),
        8 => "Right Released".into(),
        9 => "Middle Released".into(),
        10 => "Mouse Enter".into(),
        11 => "Mouse Leave".into(),
        50 => "Global Left Down".into(),
        51 => "Global Right Down".into(),
        52 => "Global Middle Down".into(),
        53 => "Global Left Pressed".into(),
        54 => "Global Right Pressed".into(),
        55 => "Global Middle Pressed".into(),
        56 => "Global Left Released".into(),
        57 => "Global Right Released".into(),
        58 => "Global Middle Released".into(),
        60 => "Mouse Wheel Up".into(),
        61 => "Mouse Wheel Down".into(),
        n => format!("Mouse {}", n),
    }
}

/// Virtual key name for keyboard events
fn key_name(code: u32) -> String {
    match code {
        0 => "No Key".into(),
        1 => "Any Key".into(),
        8 => "Backspace".into(),
        9 => "Tab".into(),
        13 => "Enter".into(),
        16 => "Shift".into(),
        17 => "Control".into(),
        18 => "Alt".into(),
        27 => "Escape".into(),
        32 => "Space".into(),
        37 => "Left".into(),
        38 => "Up".into(),
        39 => "Right".into(),
        40 => "Down".into(),
        46 => "Delete".into(),
        48..=57 | 65..=90 => char::from_u32(code)
            .map(String::from)
            .unwrap_or_else(|| code.to_string()),
        96..=105 => format!("Numpad {}", code - 96),
        112..=123 => format!("F{}", code - 111),
        n => format!("Key {}", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_stems() {
        assert_eq!(EventType::from_file_stem("Create_0"), Some(EventType::Create));
        assert_eq!(EventType::from_file_stem("Step_1"), Some(EventType::BeginStep));
        assert_eq!(EventType::from_file_stem("Step_2"), Some(EventType::EndStep));
        assert_eq!(EventType::from_file_stem("Alarm_11"), Some(EventType::Alarm(11)));
        assert_eq!(
            EventType::from_file_stem("Collision_obj_wall"),
            Some(EventType::Collision("obj_wall".into()))
        );
        assert_eq!(EventType::from_file_stem("Draw_64"), Some(EventType::Draw(64)));

        assert_eq!(EventType::from_file_stem("Alarm_12"), None);
        assert_eq!(EventType::from_file_stem("Create_1"), None);
        assert_eq!(EventType::from_file_stem("scr_util"), None);
        assert_eq!(EventType::from_file_stem("Step"), None);
        assert_eq!(EventType::from_file_stem("Step_"), None);
    }

    #[test]
    fn test_file_stem_matches_parse() {
        for stem in ["Create_0", "Step_2", "Alarm_4", "Collision_obj_a", "Draw_73", "Other_10"] {
            let event = EventType::from_file_stem(stem).unwrap();
            assert_eq!(event.file_stem(), stem);
        }
    }

    #[test]
    fn test_canonical_ordering() {
        let mut events = vec![
            EventType::EndStep,
            EventType::Draw(0),
            EventType::Mouse(4),
            EventType::CleanUp,
            EventType::Alarm(10),
            EventType::Step,
            EventType::Collision("obj_b".into()),
            EventType::KeyPress(32),
            EventType::Alarm(2),
            EventType::Collision("obj_a".into()),
            EventType::Create,
            EventType::Other(4),
            EventType::Keyboard(37),
            EventType::Destroy,
            EventType::KeyRelease(32),
        ];
        events.sort();

        assert_eq!(
            events,
            vec![
                EventType::Create,
                EventType::Destroy,
                EventType::Step,
                EventType::Alarm(2),
                EventType::Alarm(10),
                EventType::Collision("obj_a".into()),
                EventType::Collision("obj_b".into()),
                EventType::Other(4),
                EventType::Draw(0),
                EventType::KeyPress(32),
                EventType::KeyRelease(32),
                EventType::Keyboard(37),
                EventType::Mouse(4),
                EventType::CleanUp,
                EventType::EndStep,
            ]
        );
    }

    #[test]
    fn test_display_names() {
        assert_eq!(EventType::Draw(64).display_name(), "Draw GUI");
        assert_eq!(EventType::Other(12).display_name(), "User Event 2");
        assert_eq!(EventType::KeyPress(65).display_name(), "Key Press - A");
        assert_eq!(EventType::Keyboard(113).display_name(), "Keyboard - F2");
        assert_eq!(EventType::Collision("obj_wall".into()).to_string(), "Collision (obj_wall)");
    }
}
