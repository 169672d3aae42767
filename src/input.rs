use crate::app::Scene;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PlayerAction {
    MenuMove(i32),
    NameChar(char),
    NameBackspace,
    Start,
    Feed,
    Play,
    FocusNext,
    AmountChar(char),
    AmountBackspace,
    Submit,
    EndSession,
    ReturnToMenu,
    Quit,
}

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

impl InputEvent {
    #[cfg(test)]
    fn key(key: KeyCode) -> Self {
        Self {
            key,
            mods: KeyModifiers::NONE,
        }
    }
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(scene: &Scene, ev: InputEvent) -> Option<PlayerAction> {
    if matches!(ev.key, KeyCode::Char('c') | KeyCode::Char('C'))
        && ev.mods.contains(KeyModifiers::CONTROL)
    {
        return Some(PlayerAction::Quit);
    }
    // chords like Ctrl+A or Alt+x are not text
    if matches!(ev.key, KeyCode::Char(_)) && !ev.mods.difference(KeyModifiers::SHIFT).is_empty() {
        return None;
    }

    match scene {
        // the name field swallows every printable key, so only Esc quits here
        Scene::Select => match ev.key {
            KeyCode::Up => Some(PlayerAction::MenuMove(-1)),
            KeyCode::Down => Some(PlayerAction::MenuMove(1)),
            KeyCode::Enter => Some(PlayerAction::Start),
            KeyCode::Backspace => Some(PlayerAction::NameBackspace),
            KeyCode::Esc => Some(PlayerAction::Quit),
            KeyCode::Char(ch) if ch == ' ' || (ch.is_ascii() && !ch.is_ascii_control()) => {
                Some(PlayerAction::NameChar(ch))
            }
            _ => None,
        },
        Scene::Playing => match ev.key {
            KeyCode::Tab | KeyCode::BackTab => Some(PlayerAction::FocusNext),
            KeyCode::Enter => Some(PlayerAction::Submit),
            KeyCode::Backspace => Some(PlayerAction::AmountBackspace),
            KeyCode::Char(ch) if ch.is_ascii_digit() || ch == '-' => {
                Some(PlayerAction::AmountChar(ch))
            }
            KeyCode::Char('f') | KeyCode::Char('F') => Some(PlayerAction::Feed),
            KeyCode::Char('p') | KeyCode::Char('P') => Some(PlayerAction::Play),
            KeyCode::Esc => Some(PlayerAction::EndSession),
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(PlayerAction::Quit),
            _ => None,
        },
        Scene::Dead { .. } => match ev.key {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('m') | KeyCode::Char('M') => {
                Some(PlayerAction::ReturnToMenu)
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(PlayerAction::Quit),
            _ => None,
        },
    }
}
