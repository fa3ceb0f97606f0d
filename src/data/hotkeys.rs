//! Configurable keyboard shortcuts for the viewer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use eframe::egui;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    None,
    Ctrl,
    Alt,
    Shift,
    CtrlShift,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Modifier::None => "",
            Modifier::Ctrl => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
            Modifier::CtrlShift => "Ctrl+Shift",
        };
        write!(f, "{}", s)
    }
}

/// A key plus modifier. `key` is an egui key name such as `Space`, `L` or
/// `ArrowLeft`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotkey {
    pub modifier: Modifier,
    pub key: String,
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifier == Modifier::None {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifier, self.key)
        }
    }
}

impl FromStr for Hotkey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('+').map(|p| p.trim()).collect();
        let Some((last, mods)) = parts.split_last() else {
            return Err("empty hotkey".to_string());
        };
        let key = egui::Key::from_name(last)
            .ok_or_else(|| format!("unknown key '{}'", last))?
            .name()
            .to_string();
        let mut lowers: Vec<String> = mods.iter().map(|m| m.to_lowercase()).collect();
        lowers.sort();
        let modifier = match lowers.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            [] => Modifier::None,
            ["ctrl"] | ["control"] => Modifier::Ctrl,
            ["alt"] => Modifier::Alt,
            ["shift"] => Modifier::Shift,
            ["ctrl", "shift"] => Modifier::CtrlShift,
            other => return Err(format!("unknown modifier combo '{:?}'", other)),
        };
        Ok(Hotkey { modifier, key })
    }
}

impl Hotkey {
    pub fn new(modifier: Modifier, key: egui::Key) -> Self {
        Self {
            modifier,
            key: key.name().to_string(),
        }
    }

    fn egui_key(&self) -> Option<egui::Key> {
        egui::Key::from_name(&self.key)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hotkeys {
    pub play_pause: Option<Hotkey>,
    pub toggle_scale: Option<Hotkey>,
    pub step_back: Option<Hotkey>,
    pub step_forward: Option<Hotkey>,
    pub jump_back: Option<Hotkey>,
    pub jump_forward: Option<Hotkey>,
    pub open_csv: Option<Hotkey>,
}

impl Default for Hotkeys {
    fn default() -> Self {
        use egui::Key;
        Self {
            play_pause: Some(Hotkey::new(Modifier::None, Key::Space)),
            toggle_scale: Some(Hotkey::new(Modifier::None, Key::L)),
            step_back: Some(Hotkey::new(Modifier::None, Key::ArrowLeft)),
            step_forward: Some(Hotkey::new(Modifier::None, Key::ArrowRight)),
            jump_back: Some(Hotkey::new(Modifier::Shift, Key::ArrowLeft)),
            jump_forward: Some(Hotkey::new(Modifier::Shift, Key::ArrowRight)),
            open_csv: Some(Hotkey::new(Modifier::Ctrl, Key::O)),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HotkeyName {
    PlayPause,
    ToggleScale,
    StepBack,
    StepForward,
    JumpBack,
    JumpForward,
    OpenCsv,
}

impl Hotkeys {
    fn bindings(&self) -> [(HotkeyName, Option<&Hotkey>); 7] {
        [
            (HotkeyName::PlayPause, self.play_pause.as_ref()),
            (HotkeyName::ToggleScale, self.toggle_scale.as_ref()),
            (HotkeyName::StepBack, self.step_back.as_ref()),
            (HotkeyName::StepForward, self.step_forward.as_ref()),
            (HotkeyName::JumpBack, self.jump_back.as_ref()),
            (HotkeyName::JumpForward, self.jump_forward.as_ref()),
            (HotkeyName::OpenCsv, self.open_csv.as_ref()),
        ]
    }

    /// Hotkey bound to `name`, for tooltips.
    pub fn binding(&self, name: HotkeyName) -> Option<&Hotkey> {
        self.bindings().into_iter().find(|(n, _)| *n == name).and_then(|(_, hk)| hk)
    }
}

fn modifiers_match(mods: &egui::Modifiers, modifier: Modifier) -> bool {
    let ctrl = mods.ctrl || mods.command;
    let alt = mods.alt;
    let shift = mods.shift;
    match modifier {
        Modifier::None => !ctrl && !alt && !shift,
        Modifier::Ctrl => ctrl && !alt && !shift,
        Modifier::Alt => alt && !ctrl && !shift,
        Modifier::Shift => shift && !ctrl && !alt,
        Modifier::CtrlShift => ctrl && shift && !alt,
    }
}

/// Actions whose hotkey was pressed in `input`, each at most once.
pub fn actions_in(cfg: &Hotkeys, input: &egui::InputState) -> Vec<HotkeyName> {
    let mut actions = Vec::new();
    for (name, hk) in cfg.bindings() {
        let Some(hk) = hk else { continue };
        let Some(key) = hk.egui_key() else { continue };
        if modifiers_match(&input.modifiers, hk.modifier)
            && input.key_pressed(key)
            && !actions.contains(&name)
        {
            actions.push(name);
        }
    }
    actions
}

/// Hotkey actions for this frame; empty while a text field has focus.
pub fn detect_hotkey_actions(cfg: &Hotkeys, ctx: &egui::Context) -> Vec<HotkeyName> {
    if ctx.wants_keyboard_input() {
        return Vec::new();
    }
    ctx.input(|i| actions_in(cfg, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let hk: Hotkey = "Shift+ArrowRight".parse().unwrap();
        assert_eq!(hk, Hotkey::new(Modifier::Shift, egui::Key::ArrowRight));
        assert_eq!(hk.to_string(), "Shift+ArrowRight");
        let hk: Hotkey = "Ctrl+Space".parse().unwrap();
        assert_eq!((hk.modifier, hk.key.as_str()), (Modifier::Ctrl, "Space"));
        assert!("Hyper+Q".parse::<Hotkey>().is_err());
        assert!("Ctrl+NoSuchKey".parse::<Hotkey>().is_err());
    }

    #[test]
    fn defaults_bind_space_and_l() {
        let hk = Hotkeys::default();
        assert_eq!(hk.binding(HotkeyName::PlayPause).map(|h| h.key.as_str()), Some("Space"));
        assert_eq!(hk.binding(HotkeyName::ToggleScale).map(|h| h.key.as_str()), Some("L"));
    }

    #[test]
    fn shift_distinguishes_step_from_jump() {
        let none = egui::Modifiers::NONE;
        let shift = egui::Modifiers::SHIFT;
        assert!(modifiers_match(&none, Modifier::None));
        assert!(!modifiers_match(&shift, Modifier::None));
        assert!(modifiers_match(&shift, Modifier::Shift));
        assert!(modifiers_match(&egui::Modifiers::COMMAND, Modifier::Ctrl));
    }
}
