use crate::config::{ensure_settings_file, load_settings, project_paths, Settings};
use crate::input::{collect_input_nonblocking, map_event_to_action, PlayerAction};
use crate::model::{Amount, Species, SpeciesTable, NAME_MAX};
use crate::render::{draw_frame, Terminal, Theme};
use crate::scheduler::{Clock, MonotonicClock};
use crate::sim::{PetObserver, Session};
use crate::Cli;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const AMOUNT_TEXT_MAX: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Scene {
    Select,
    Playing,
    Dead { name: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Field {
    Food,
    Play,
}

/// What the screen shows, fed only by session notifications.
#[derive(Clone, Debug, Default)]
pub(crate) struct StatusBoard {
    pub(crate) hunger: u8,
    pub(crate) boredom: u8,
    death: Option<String>,
}

impl PetObserver for StatusBoard {
    fn on_stats_changed(&mut self, hunger: u8, boredom: u8) {
        self.hunger = hunger;
        self.boredom = boredom;
    }

    fn on_death(&mut self, name: &str) {
        self.death = Some(name.to_string());
    }
}

/// Front-end state: one session plus the menu and control fields around it.
pub(crate) struct Game<C: Clock> {
    pub(crate) session: Session<C>,
    pub(crate) scene: Scene,
    pub(crate) status: StatusBoard,
    pub(crate) cursor: usize,
    pub(crate) name_edit: String,
    pub(crate) food_text: String,
    pub(crate) play_text: String,
    pub(crate) focus: Field,
    default_amount: String,
}

impl<C: Clock> Game<C> {
    pub(crate) fn new(session: Session<C>, default_amount: String) -> Self {
        Self {
            session,
            scene: Scene::Select,
            status: StatusBoard::default(),
            cursor: 0,
            name_edit: String::new(),
            food_text: default_amount.clone(),
            play_text: default_amount.clone(),
            focus: Field::Food,
            default_amount,
        }
    }

    pub(crate) fn selected(&self) -> Species {
        Species::ALL[self.cursor % Species::ALL.len()]
    }

    pub(crate) fn start(&mut self, species: Species, name: &str) {
        self.status = StatusBoard::default();
        self.session.start(species, name, &mut self.status);
        self.food_text = self.default_amount.clone();
        self.play_text = self.default_amount.clone();
        self.focus = Field::Food;
        self.scene = Scene::Playing;
    }

    /// Returns false once the player asked to quit.
    pub(crate) fn apply(&mut self, action: PlayerAction) -> bool {
        match action {
            PlayerAction::MenuMove(delta) => {
                let len = Species::ALL.len() as i32;
                self.cursor = (self.cursor as i32 + delta).rem_euclid(len) as usize;
            }
            PlayerAction::NameChar(ch) => {
                if self.name_edit.chars().count() < NAME_MAX {
                    self.name_edit.push(ch);
                }
            }
            PlayerAction::NameBackspace => {
                self.name_edit.pop();
            }
            PlayerAction::Start => {
                let name = self.name_edit.clone();
                self.start(self.selected(), &name);
            }
            PlayerAction::Feed => self.feed(),
            PlayerAction::Play => self.play(),
            PlayerAction::Submit => match self.focus {
                Field::Food => self.feed(),
                Field::Play => self.play(),
            },
            PlayerAction::FocusNext => {
                self.focus = match self.focus {
                    Field::Food => Field::Play,
                    Field::Play => Field::Food,
                };
            }
            PlayerAction::AmountChar(ch) => {
                let text = self.focused_text();
                if text.len() < AMOUNT_TEXT_MAX {
                    text.push(ch);
                }
            }
            PlayerAction::AmountBackspace => {
                self.focused_text().pop();
            }
            PlayerAction::EndSession => {
                self.session.stop();
                self.scene = Scene::Select;
            }
            PlayerAction::ReturnToMenu => self.scene = Scene::Select,
            PlayerAction::Quit => return false,
        }
        true
    }

    /// Advances the simulation and flips to the death screen when it happens.
    pub(crate) fn update(&mut self) {
        self.session.pump(&mut self.status);
        if let Some(name) = self.status.death.take() {
            self.scene = Scene::Dead { name };
        }
    }

    fn feed(&mut self) {
        let outcome = self
            .food_text
            .parse::<Amount>()
            .and_then(|a| self.session.feed(a, &mut self.status));
        if let Err(e) = outcome {
            debug!(error = %e, "feed ignored");
        }
    }

    fn play(&mut self) {
        let outcome = self
            .play_text
            .parse::<Amount>()
            .and_then(|a| self.session.play(a, &mut self.status));
        if let Err(e) = outcome {
            debug!(error = %e, "play ignored");
        }
    }

    fn focused_text(&mut self) -> &mut String {
        match self.focus {
            Field::Food => &mut self.food_text,
            Field::Play => &mut self.play_text,
        }
    }
}

pub(crate) struct App {
    settings: Settings,
    theme: Theme,
    game: Game<MonotonicClock>,
    term: Terminal,
}

impl App {
    fn init(cli: &Cli) -> anyhow::Result<Self> {
        let paths = project_paths()?;
        let log_path = cli.log_file.clone().unwrap_or(paths.log_path);
        crate::logging::init(&log_path, &cli.log_level)?;

        let mut settings = load_settings(&paths.settings_path);
        ensure_settings_file(&paths.settings_path, &settings)?;
        if let Some(ms) = cli.tick_ms {
            settings.tick_ms = ms;
        }
        if cli.no_color {
            settings.enable_color = false;
        }
        info!(?settings, "starting");

        let session = Session::new(
            MonotonicClock::new(),
            settings.tick_interval(),
            SpeciesTable::default(),
        );
        let mut game = Game::new(session, settings.default_amount_text());
        if let Some(species) = cli.species {
            game.start(species, cli.name.as_deref().unwrap_or_default());
        }

        let theme = Theme::new(settings.enable_color);
        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            theme,
            game,
            term,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = self.settings.frame_time();
        let mut running = true;

        while running {
            self.term.resize_if_needed()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(&self.game.scene, ev) {
                    if !self.game.apply(action) {
                        running = false;
                        break;
                    }
                }
            }

            self.game.update();

            draw_frame(self.term.canvas(), &self.game, &self.theme);
            self.term.present()?;

            pace_frame(frame_dt, Instant::now());
        }

        self.game.session.stop();
        self.term.end()?;
        info!(state = ?self.game.session.state(), ticks = self.game.session.ticks(), "bye");
        Ok(())
    }
}

pub(crate) fn run(cli: Cli) -> anyhow::Result<()> {
    let mut app = App::init(&cli)?;
    let result = app.run();
    if result.is_err() {
        // leave the terminal usable even if the loop failed
        let _ = app.term.end();
    }
    result
}

fn pace_frame(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{ManualClock, SchedulerState};

    const SEC: Duration = Duration::from_secs(1);

    fn game(clock: &ManualClock) -> Game<&ManualClock> {
        let session = Session::new(clock, SEC, SpeciesTable::default());
        Game::new(session, "5".to_string())
    }

    fn type_name(g: &mut Game<&ManualClock>, name: &str) {
        for ch in name.chars() {
            g.apply(PlayerAction::NameChar(ch));
        }
    }

    #[test]
    fn menu_cursor_wraps() {
        let clock = ManualClock::default();
        let mut g = game(&clock);
        assert_eq!(g.selected(), Species::Dog);
        g.apply(PlayerAction::MenuMove(-1));
        assert_eq!(g.selected(), Species::Turtle);
        g.apply(PlayerAction::MenuMove(1));
        g.apply(PlayerAction::MenuMove(1));
        assert_eq!(g.selected(), Species::Cat);
    }

    #[test]
    fn name_is_capped() {
        let clock = ManualClock::default();
        let mut g = game(&clock);
        type_name(&mut g, "abcdefghijklmnopqrstuvwxyz");
        assert_eq!(g.name_edit.len(), NAME_MAX);
        g.apply(PlayerAction::NameBackspace);
        assert_eq!(g.name_edit.len(), NAME_MAX - 1);
    }

    #[test]
    fn start_then_feed_from_entry() {
        let clock = ManualClock::default();
        let mut g = game(&clock);
        g.apply(PlayerAction::MenuMove(1));
        type_name(&mut g, "Tom");
        g.apply(PlayerAction::Start);
        assert_eq!(g.scene, Scene::Playing);
        assert_eq!(g.session.pet().unwrap().name, "Tom");
        assert_eq!((g.status.hunger, g.status.boredom), (100, 100));

        clock.advance(SEC * 9);
        g.update();
        assert_eq!((g.status.hunger, g.status.boredom), (70, 80));

        g.apply(PlayerAction::Feed);
        assert_eq!(g.status.hunger, 75);

        g.apply(PlayerAction::FocusNext);
        g.apply(PlayerAction::AmountBackspace);
        g.apply(PlayerAction::AmountChar('9'));
        g.apply(PlayerAction::Submit);
        assert_eq!(g.status.boredom, 89);
    }

    #[test]
    fn bad_entries_do_nothing() {
        let clock = ManualClock::default();
        let mut g = game(&clock);
        g.start(Species::Dog, "Rex");
        clock.advance(SEC * 20);
        g.update();
        let before = (g.status.hunger, g.status.boredom);

        for text in ["", "-1", "11", "-"] {
            g.food_text = text.to_string();
            g.play_text = text.to_string();
            g.apply(PlayerAction::Feed);
            g.apply(PlayerAction::Play);
        }
        assert_eq!((g.status.hunger, g.status.boredom), before);
    }

    #[test]
    fn amount_entry_is_short() {
        let clock = ManualClock::default();
        let mut g = game(&clock);
        g.start(Species::Dog, "Rex");
        for ch in "12345".chars() {
            g.apply(PlayerAction::AmountChar(ch));
        }
        assert_eq!(g.food_text, "512");
    }

    #[test]
    fn death_shows_end_screen_then_menu() {
        let clock = ManualClock::default();
        let mut g = game(&clock);
        g.start(Species::Turtle, "Shelly");
        clock.advance(SEC * 23);
        g.update();
        assert_eq!(g.scene, Scene::Playing);

        clock.advance(SEC);
        g.update();
        assert_eq!(
            g.scene,
            Scene::Dead {
                name: "Shelly".into()
            }
        );
        assert_eq!(g.session.state(), SchedulerState::Stopped);

        g.apply(PlayerAction::ReturnToMenu);
        assert_eq!(g.scene, Scene::Select);
        clock.advance(SEC * 10);
        g.update();
        assert_eq!(g.scene, Scene::Select);
    }

    #[test]
    fn ending_a_session_skips_the_death_screen() {
        let clock = ManualClock::default();
        let mut g = game(&clock);
        g.start(Species::Cat, "Tom");
        g.apply(PlayerAction::EndSession);
        assert_eq!(g.scene, Scene::Select);
        assert_eq!(g.session.state(), SchedulerState::Stopped);
        clock.advance(SEC * 120);
        g.update();
        assert_eq!(g.scene, Scene::Select);
    }

    #[test]
    fn restart_resets_board_and_entries() {
        let clock = ManualClock::default();
        let mut g = game(&clock);
        g.start(Species::Rabbit, "Bun");
        g.food_text = "9".into();
        clock.advance(SEC * 5);
        g.update();
        g.start(Species::Dog, "");
        assert_eq!(g.food_text, "5");
        assert_eq!((g.status.hunger, g.status.boredom), (100, 100));
        assert_eq!(g.session.pet().unwrap().name, "Unnamed");
    }

    #[test]
    fn quit_stops_the_loop() {
        let clock = ManualClock::default();
        let mut g = game(&clock);
        assert!(g.apply(PlayerAction::MenuMove(1)));
        assert!(!g.apply(PlayerAction::Quit));
    }
}
