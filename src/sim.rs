use crate::error::CommandError;
use crate::model::{Amount, Pet, Species, SpeciesTable};
use crate::scheduler::{Clock, IntervalTimer, SchedulerState};
use std::time::Duration;
use tracing::{debug, info, trace};

/// Outbound port to whatever shows the pet.
pub(crate) trait PetObserver {
    fn on_stats_changed(&mut self, hunger: u8, boredom: u8);
    fn on_death(&mut self, name: &str);
}

/// One pet at a time plus the timer that ages it.
pub(crate) struct Session<C: Clock> {
    clock: C,
    table: SpeciesTable,
    timer: IntervalTimer,
    state: SchedulerState,
    pet: Option<Pet>,
    species: Option<Species>,
    ticks: u64,
}

impl<C: Clock> Session<C> {
    pub(crate) fn new(clock: C, tick: Duration, table: SpeciesTable) -> Self {
        Self {
            clock,
            table,
            timer: IntervalTimer::new(tick),
            state: SchedulerState::Idle,
            pet: None,
            species: None,
            ticks: 0,
        }
    }

    pub(crate) fn state(&self) -> SchedulerState {
        self.state
    }

    pub(crate) fn pet(&self) -> Option<&Pet> {
        self.pet.as_ref()
    }

    pub(crate) fn species(&self) -> Option<Species> {
        self.species
    }

    pub(crate) fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Replaces any previous pet with a fresh one and starts the clock.
    pub(crate) fn start(&mut self, species: Species, name: &str, obs: &mut dyn PetObserver) {
        if self.state == SchedulerState::Running {
            self.stop();
        }

        let pet = Pet::new(name, self.table.rates(species));
        info!(
            species = %species,
            name = %pet.name,
            hunger_rate = pet.rates.hunger.get(),
            boredom_rate = pet.rates.boredom.get(),
            tick_ms = self.timer.interval().as_millis() as u64,
            "session started"
        );
        obs.on_stats_changed(pet.hunger, pet.boredom);

        self.pet = Some(pet);
        self.species = Some(species);
        self.ticks = 0;
        self.timer.start(self.clock.now());
        self.state = SchedulerState::Running;
    }

    pub(crate) fn feed(&mut self, amount: Amount, obs: &mut dyn PetObserver) -> Result<(), CommandError> {
        let pet = self.live_pet()?;
        pet.feed(amount);
        debug!(amount = amount.get(), hunger = pet.hunger, "fed");
        obs.on_stats_changed(pet.hunger, pet.boredom);
        Ok(())
    }

    pub(crate) fn play(&mut self, amount: Amount, obs: &mut dyn PetObserver) -> Result<(), CommandError> {
        let pet = self.live_pet()?;
        pet.play(amount);
        debug!(amount = amount.get(), boredom = pet.boredom, "played");
        obs.on_stats_changed(pet.hunger, pet.boredom);
        Ok(())
    }

    /// Runs every tick that has come due. Returns how many ran.
    pub(crate) fn pump(&mut self, obs: &mut dyn PetObserver) -> u32 {
        if self.state != SchedulerState::Running || !self.timer.is_armed() {
            return 0;
        }
        let now = self.clock.now();
        let mut ran = 0;

        while self.timer.fire_due(now) {
            let Some(pet) = self.pet.as_mut() else {
                self.timer.cancel();
                break;
            };
            let died = pet.tick();
            self.ticks += 1;
            ran += 1;
            trace!(tick = self.ticks, hunger = pet.hunger, boredom = pet.boredom, "tick");
            obs.on_stats_changed(pet.hunger, pet.boredom);

            if died {
                self.timer.cancel();
                self.state = SchedulerState::Stopped;
                info!(name = %pet.name, ticks = self.ticks, "pet died");
                obs.on_death(&pet.name);
                break;
            }
        }
        ran
    }

    /// User-initiated end of session. No death notification.
    pub(crate) fn stop(&mut self) {
        if self.state != SchedulerState::Running {
            return;
        }
        self.timer.cancel();
        self.state = SchedulerState::Stopped;
        info!(ticks = self.ticks, "session stopped");
    }

    fn live_pet(&mut self) -> Result<&mut Pet, CommandError> {
        match (self.state, self.pet.as_mut()) {
            (SchedulerState::Running, Some(pet)) if pet.alive() => Ok(pet),
            (_, Some(pet)) if !pet.alive() => Err(CommandError::PetDead),
            _ => Err(CommandError::NoSession),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualClock;

    const SEC: Duration = Duration::from_secs(1);

    #[derive(Default)]
    struct Recorder {
        stats: Vec<(u8, u8)>,
        deaths: Vec<String>,
    }

    impl PetObserver for Recorder {
        fn on_stats_changed(&mut self, hunger: u8, boredom: u8) {
            self.stats.push((hunger, boredom));
        }
        fn on_death(&mut self, name: &str) {
            self.deaths.push(name.to_string());
        }
    }

    fn session(clock: &ManualClock) -> Session<&ManualClock> {
        Session::new(clock, SEC, SpeciesTable::default())
    }

    fn amount(n: i64) -> Amount {
        Amount::new(n).unwrap()
    }

    #[test]
    fn starts_idle_and_runs_after_start() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        assert_eq!(s.state(), SchedulerState::Idle);
        assert!(s.pet().is_none());
        assert_eq!(s.pump(&mut rec), 0);

        s.start(Species::Cat, "Tom", &mut rec);
        assert_eq!(s.state(), SchedulerState::Running);
        assert_eq!(s.species(), Some(Species::Cat));
        assert_eq!(rec.stats, vec![(100, 100)]);
    }

    #[test]
    fn commands_without_session_are_rejected() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        assert_eq!(s.feed(amount(3), &mut rec), Err(CommandError::NoSession));
        assert_eq!(s.play(amount(3), &mut rec), Err(CommandError::NoSession));
        assert!(rec.stats.is_empty());
    }

    #[test]
    fn ticks_follow_the_clock() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        s.start(Species::Cat, "Tom", &mut rec);

        clock.advance(Duration::from_millis(900));
        assert_eq!(s.pump(&mut rec), 1);
        clock.advance(Duration::from_millis(100));
        assert_eq!(s.pump(&mut rec), 1);
        clock.advance(SEC * 2);
        assert_eq!(s.pump(&mut rec), 2);

        assert_eq!(s.ticks(), 4);
        assert_eq!(rec.stats.last(), Some(&(88, 92)));
        assert_eq!(rec.stats.len(), 5);
    }

    #[test]
    fn first_tick_runs_at_start() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        s.start(Species::Dog, "Rex", &mut rec);

        assert_eq!(s.pump(&mut rec), 1);
        assert_eq!(s.ticks(), 1);
        assert_eq!(s.pet().unwrap().hunger, 98);
        assert_eq!(rec.stats, vec![(100, 100), (98, 98)]);
        assert_eq!(s.pump(&mut rec), 0);
    }

    #[test]
    fn dog_dies_once_at_tick_fifty() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        s.start(Species::Dog, "Rex", &mut rec);

        assert_eq!(s.pump(&mut rec), 1);
        for n in 2..=49 {
            clock.advance(SEC);
            assert_eq!(s.pump(&mut rec), 1);
            assert!(rec.deaths.is_empty(), "death before tick 50 (at {n})");
        }
        clock.advance(SEC);
        assert_eq!(s.pump(&mut rec), 1);
        assert_eq!(clock.now(), SEC * 49);
        assert_eq!(rec.deaths, vec!["Rex".to_string()]);
        assert_eq!(s.state(), SchedulerState::Stopped);
        assert_eq!(s.ticks(), 50);

        let pet = s.pet().unwrap();
        assert_eq!((pet.hunger, pet.boredom), (0, 0));
        assert!(!pet.alive());

        let seen = rec.stats.len();
        clock.advance(SEC * 30);
        assert_eq!(s.pump(&mut rec), 0);
        assert_eq!(rec.stats.len(), seen);
        assert_eq!(rec.deaths.len(), 1);
    }

    #[test]
    fn catch_up_stops_at_death() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        s.start(Species::Turtle, "Shelly", &mut rec);

        clock.advance(SEC * 23);
        assert_eq!(s.pump(&mut rec), 24);
        let pet = s.pet().unwrap();
        assert_eq!((pet.hunger, pet.boredom), (76, 4));

        clock.advance(SEC * 100);
        assert_eq!(s.pump(&mut rec), 1);
        assert_eq!(s.ticks(), 25);
        assert_eq!(rec.deaths, vec!["Shelly".to_string()]);
        assert_eq!(s.pet().unwrap().boredom, 0);
    }

    #[test]
    fn feed_and_play_notify() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        s.start(Species::Rabbit, "Bun", &mut rec);
        clock.advance(SEC * 3);
        s.pump(&mut rec);
        assert_eq!(rec.stats.last(), Some(&(88, 88)));

        s.feed(amount(5), &mut rec).unwrap();
        assert_eq!(rec.stats.last(), Some(&(93, 88)));
        s.play(amount(10), &mut rec).unwrap();
        assert_eq!(rec.stats.last(), Some(&(93, 98)));
        s.play(amount(10), &mut rec).unwrap();
        assert_eq!(rec.stats.last(), Some(&(93, 100)));
    }

    #[test]
    fn invalid_text_never_reaches_the_pet() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        s.start(Species::Dog, "Rex", &mut rec);
        clock.advance(SEC * 10);
        s.pump(&mut rec);
        let before = s.pet().cloned();

        for text in ["-1", "11", "ten", ""] {
            let outcome = text
                .parse::<Amount>()
                .and_then(|a| s.feed(a, &mut rec));
            assert!(outcome.is_err(), "{text:?} accepted");
        }
        assert_eq!(s.pet().cloned(), before);
    }

    #[test]
    fn commands_after_death_are_refused() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        s.start(Species::Turtle, "Shelly", &mut rec);
        clock.advance(SEC * 25);
        s.pump(&mut rec);
        assert_eq!(s.state(), SchedulerState::Stopped);

        let seen = rec.stats.len();
        assert_eq!(s.feed(amount(10), &mut rec), Err(CommandError::PetDead));
        assert_eq!(s.play(amount(10), &mut rec), Err(CommandError::PetDead));
        assert_eq!(rec.stats.len(), seen);
        assert_eq!(s.pet().unwrap().boredom, 0);
    }

    #[test]
    fn explicit_stop_is_silent_and_final() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        s.start(Species::Dog, "Rex", &mut rec);
        clock.advance(SEC * 2);
        s.pump(&mut rec);

        s.stop();
        assert_eq!(s.state(), SchedulerState::Stopped);
        clock.advance(SEC * 100);
        assert_eq!(s.pump(&mut rec), 0);
        assert!(rec.deaths.is_empty());
        assert_eq!(s.feed(amount(1), &mut rec), Err(CommandError::NoSession));
        assert_eq!(s.pet().unwrap().hunger, 94);
    }

    #[test]
    fn new_session_starts_fresh() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        s.start(Species::Turtle, "Shelly", &mut rec);
        clock.advance(SEC * 25);
        s.pump(&mut rec);

        s.start(Species::Cat, "", &mut rec);
        assert_eq!(s.state(), SchedulerState::Running);
        assert_eq!(s.ticks(), 0);
        let pet = s.pet().unwrap();
        assert_eq!(pet.name, "Unnamed");
        assert_eq!((pet.hunger, pet.boredom), (100, 100));
        assert!(pet.alive());

        // the new timer counts from the restart, not from the old origin
        assert_eq!(s.pump(&mut rec), 1);
        clock.advance(Duration::from_millis(500));
        assert_eq!(s.pump(&mut rec), 0);
        clock.advance(Duration::from_millis(500));
        assert_eq!(s.pump(&mut rec), 1);
    }

    #[test]
    fn restarting_while_running_drops_old_pet() {
        let clock = ManualClock::default();
        let mut s = session(&clock);
        let mut rec = Recorder::default();
        s.start(Species::Dog, "First", &mut rec);
        clock.advance(SEC * 5);
        s.pump(&mut rec);
        s.start(Species::Rabbit, "Second", &mut rec);
        assert_eq!(s.pet().unwrap().name, "Second");
        assert_eq!(s.pet().unwrap().hunger, 100);
        assert!(rec.deaths.is_empty());
    }
}
