use crate::error::CommandError;
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU8;
use std::str::FromStr;

pub(crate) const STAT_MAX: u8 = 100;
pub(crate) const AMOUNT_MAX: u8 = 10;
pub(crate) const NAME_MAX: usize = 18;
pub(crate) const DEFAULT_NAME: &str = "Unnamed";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub(crate) enum Species {
    Dog,
    Cat,
    Rabbit,
    Turtle,
}

impl Species {
    pub(crate) const ALL: [Species; 4] = [Species::Dog, Species::Cat, Species::Rabbit, Species::Turtle];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Species::Dog => "Dog",
            Species::Cat => "Cat",
            Species::Rabbit => "Rabbit",
            Species::Turtle => "Turtle",
        }
    }

    fn default_rates(self) -> Rates {
        match self {
            Species::Dog => Rates::from_consts(2, 2),
            Species::Cat => Rates::from_consts(3, 2),
            Species::Rabbit => Rates::from_consts(3, 3),
            Species::Turtle => Rates::from_consts(1, 4),
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-tick decay for the two stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rates {
    pub(crate) hunger: NonZeroU8,
    pub(crate) boredom: NonZeroU8,
}

impl Rates {
    #[cfg(test)]
    pub(crate) fn new(hunger: u8, boredom: u8) -> Option<Self> {
        Some(Self {
            hunger: NonZeroU8::new(hunger)?,
            boredom: NonZeroU8::new(boredom)?,
        })
    }

    const fn from_consts(hunger: u8, boredom: u8) -> Self {
        match (NonZeroU8::new(hunger), NonZeroU8::new(boredom)) {
            (Some(hunger), Some(boredom)) => Self { hunger, boredom },
            _ => panic!("species rates must be positive"),
        }
    }
}

/// Species to decay rates. Anything not overridden uses the built-in constants.
#[derive(Clone, Debug, Default)]
pub(crate) struct SpeciesTable {
    overrides: BTreeMap<Species, Rates>,
}

impl SpeciesTable {
    #[cfg(test)]
    pub(crate) fn with_rates(mut self, species: Species, rates: Rates) -> Self {
        self.overrides.insert(species, rates);
        self
    }

    pub(crate) fn rates(&self, species: Species) -> Rates {
        self.overrides
            .get(&species)
            .copied()
            .unwrap_or_else(|| species.default_rates())
    }
}

/// A feed or play amount that has already passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Amount(u8);

impl Amount {
    pub(crate) fn new(value: i64) -> Result<Self, CommandError> {
        if (0..=AMOUNT_MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(CommandError::OutOfRange(value))
        }
    }

    pub(crate) fn get(self) -> u8 {
        self.0
    }
}

impl FromStr for Amount {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| CommandError::NotANumber(s.to_string()))?;
        Amount::new(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Pet {
    pub(crate) name: String,
    pub(crate) rates: Rates,
    pub(crate) hunger: u8,
    pub(crate) boredom: u8,
    alive: bool,
}

impl Pet {
    pub(crate) fn new(name: &str, rates: Rates) -> Self {
        let trimmed = name.trim();
        Self {
            name: if trimmed.is_empty() {
                DEFAULT_NAME.to_string()
            } else {
                trimmed.to_string()
            },
            rates,
            hunger: STAT_MAX,
            boredom: STAT_MAX,
            alive: true,
        }
    }

    pub(crate) fn alive(&self) -> bool {
        self.alive
    }

    // No aliveness check here; the session gates commands on a dead pet.
    pub(crate) fn feed(&mut self, amount: Amount) {
        self.hunger = self.hunger.saturating_add(amount.get()).min(STAT_MAX);
    }

    pub(crate) fn play(&mut self, amount: Amount) {
        self.boredom = self.boredom.saturating_add(amount.get()).min(STAT_MAX);
    }

    /// One decay step. Returns true only on the tick that kills the pet.
    pub(crate) fn tick(&mut self) -> bool {
        self.hunger = self.hunger.saturating_sub(self.rates.hunger.get());
        self.boredom = self.boredom.saturating_sub(self.rates.boredom.get());

        if self.alive && (self.hunger == 0 || self.boredom == 0) {
            self.alive = false;
            return true;
        }
        false
    }
}
