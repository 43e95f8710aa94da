//! Raw User Profile
//!
//! The categorical vocabularies below are the exact labels the models were
//! trained on. They double as the suffix of each one-hot column name, so they
//! must never be translated or reformatted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::FeatureError;

/// Name of the numeric age column in the training schema
pub const AGE_COLUMN: &str = "Edad";

/// A closed categorical field that one-hot encodes into `<prefix>_<label>`
pub trait Categorical: Copy + Sized + 'static {
    /// Human-facing field name (used in errors and the echo table)
    const FIELD: &'static str;
    /// Column prefix used by the training-time one-hot encoding
    const PREFIX: &'static str;

    /// Every value of the field, in display order
    fn all() -> &'static [Self];

    /// Training label of this value
    fn label(&self) -> &'static str;

    /// Indicator column name for this value
    fn indicator(&self) -> String {
        format!("{}_{}", Self::PREFIX, self.label())
    }

    /// Every label of the field, in display order
    fn labels() -> Vec<&'static str> {
        Self::all().iter().map(|v| v.label()).collect()
    }

    /// Parse a training label (surrounding whitespace ignored)
    fn from_label(label: &str) -> Result<Self, FeatureError> {
        let label = label.trim();
        Self::all()
            .iter()
            .copied()
            .find(|v| v.label() == label)
            .ok_or_else(|| FeatureError::UnknownCategory {
                field: Self::FIELD,
                value: label.to_string(),
            })
    }
}

/// Gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Categorical for Gender {
    const FIELD: &'static str = "gender";
    const PREFIX: &'static str = "Sexo";

    fn all() -> &'static [Self] {
        &[Gender::Male, Gender::Female, Gender::Other]
    }

    fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Hombre",
            Gender::Female => "Mujer",
            Gender::Other => "Otro",
        }
    }
}

/// Preferred video game genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameGenre {
    EpicActionRpg,
    UrbanStrategySimulation,
    ImmersiveSurvivalHorror,
    CompetitiveFirstPersonShooter,
    RealisticSportsSimulation,
    HighSpeedRacing,
    FantasyOpenWorldAdventure,
    TacticalSciFiShooter,
}

impl Categorical for GameGenre {
    const FIELD: &'static str = "genre";
    const PREFIX: &'static str = "videojuego";

    fn all() -> &'static [Self] {
        &[
            GameGenre::EpicActionRpg,
            GameGenre::UrbanStrategySimulation,
            GameGenre::ImmersiveSurvivalHorror,
            GameGenre::CompetitiveFirstPersonShooter,
            GameGenre::RealisticSportsSimulation,
            GameGenre::HighSpeedRacing,
            GameGenre::FantasyOpenWorldAdventure,
            GameGenre::TacticalSciFiShooter,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            GameGenre::EpicActionRpg => "RPG de Acción Épica",
            GameGenre::UrbanStrategySimulation => "Simulación Estratégica Urbana",
            GameGenre::ImmersiveSurvivalHorror => "Survival Horror Inmersivo",
            GameGenre::CompetitiveFirstPersonShooter => "Shooter en Primera Persona Competitivo",
            GameGenre::RealisticSportsSimulation => "Deportes y Simulación Realista",
            GameGenre::HighSpeedRacing => "Carreras de Alta Velocidad",
            GameGenre::FantasyOpenWorldAdventure => "Aventura de Mundo Abierto Fantástica",
            GameGenre::TacticalSciFiShooter => "Ciencia Ficción y Disparos Tácticos",
        }
    }
}

/// Preferred gaming platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Pc,
    Xbox,
    PlayStation,
    Other,
}

impl Categorical for Platform {
    const FIELD: &'static str = "platform";
    const PREFIX: &'static str = "Plataforma";

    fn all() -> &'static [Self] {
        &[Platform::Pc, Platform::Xbox, Platform::PlayStation, Platform::Other]
    }

    fn label(&self) -> &'static str {
        match self {
            Platform::Pc => "Ordenador (PC)",
            Platform::Xbox => "Xbox",
            Platform::PlayStation => "Play Station",
            Platform::Other => "Otras",
        }
    }
}

/// How often the user plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayFrequency {
    Daily,
    Weekly,
    Monthly,
    Rarely,
}

impl Categorical for PlayFrequency {
    const FIELD: &'static str = "frequency";
    const PREFIX: &'static str = "Consumidor_habitual";

    fn all() -> &'static [Self] {
        &[
            PlayFrequency::Daily,
            PlayFrequency::Weekly,
            PlayFrequency::Monthly,
            PlayFrequency::Rarely,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            PlayFrequency::Daily => "Diariamente",
            PlayFrequency::Weekly => "Semanalmente",
            PlayFrequency::Monthly => "Mensualmente",
            PlayFrequency::Rarely => "Rara vez",
        }
    }
}

macro_rules! impl_label_traits {
    ($($ty:ty),+) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = FeatureError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_label(s)
            }
        }
    )+};
}

impl_label_traits!(Gender, GameGenre, Platform, PlayFrequency);

/// One user submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProfile {
    /// Age in years
    pub age: u32,
    pub gender: Gender,
    pub genre: GameGenre,
    pub platform: Platform,
    pub frequency: PlayFrequency,
}

impl RawProfile {
    /// Indicator column names for the four categorical fields, in encoding order
    pub fn indicators(&self) -> [String; 4] {
        [
            self.genre.indicator(),
            self.platform.indicator(),
            self.gender.indicator(),
            self.frequency.indicator(),
        ]
    }

    /// `(field, value)` pairs for echoing the submission back to the user
    pub fn echo(&self) -> Vec<(&'static str, String)> {
        vec![
            ("age", self.age.to_string()),
            (GameGenre::FIELD, self.genre.to_string()),
            (Platform::FIELD, self.platform.to_string()),
            (Gender::FIELD, self.gender.to_string()),
            (PlayFrequency::FIELD, self.frequency.to_string()),
        ]
    }
}
