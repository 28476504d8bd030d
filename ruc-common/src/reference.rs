//! Static reference data
//!
//! Subjects, the grade scale, and the term/year/location options offered to
//! reviewers. The subject list is loaded once into an immutable [`Catalog`]
//! which is handed to whatever needs it; nothing here is global.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of selectable years, counting back from the current year
pub const YEAR_OPTION_COUNT: i32 = 30;

/// An academic subject reviews are filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub code: String,
    pub name: String,
}

impl Subject {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Immutable list of subjects known to this deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    subjects: Vec<Subject>,
}

impl Catalog {
    pub fn new(subjects: Vec<Subject>) -> Self {
        Self { subjects }
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn get(&self, code: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_SUBJECTS
                .iter()
                .map(|(code, name)| Subject::new(*code, *name))
                .collect(),
        )
    }
}

const DEFAULT_SUBJECTS: &[(&str, &str)] = &[
    ("010", "Accounting"),
    ("013", "African, Middle Eastern, and South Asian Languages and Literatures"),
    ("014", "Africana Studies"),
    ("050", "American Studies"),
    ("070", "Anthropology"),
    ("082", "Art History"),
    ("090", "Arts and Sciences"),
    ("098", "Asian Studies"),
    ("115", "Biochemistry"),
    ("119", "Biological Sciences"),
    ("125", "Biomedical Engineering"),
    ("136", "Business Analytics and Information Technology"),
    ("140", "Business Law"),
    ("155", "Chemical and Biochemical Engineering"),
    ("160", "Chemistry"),
    ("180", "Civil and Environmental Engineering"),
    ("185", "Cognitive Science"),
    ("190", "Classics"),
    ("192", "Communication"),
    ("198", "Computer Science"),
    ("202", "Criminal Justice"),
    ("220", "Economics"),
    ("300", "Education"),
    ("332", "Electrical and Computer Engineering"),
    ("350", "English"),
    ("355", "English: Composition and Writing"),
    ("373", "Environmental Policy, Institutions and Behavior"),
    ("375", "Environmental Sciences"),
    ("390", "Finance"),
    ("420", "French"),
    ("440", "General Engineering"),
    ("447", "Genetics"),
    ("450", "Geography"),
    ("460", "Earth and Planetary Sciences"),
    ("470", "German"),
    ("489", "Greek"),
    ("506", "History: General"),
    ("510", "History: European"),
    ("512", "History: American"),
    ("540", "Industrial and Systems Engineering"),
    ("547", "Information Technology and Informatics"),
    ("560", "Italian"),
    ("565", "Japanese"),
    ("567", "Journalism and Media Studies"),
    ("574", "Korean"),
    ("580", "Latin"),
    ("590", "Latino and Caribbean Studies"),
    ("615", "Linguistics"),
    ("620", "Management"),
    ("630", "Marketing"),
    ("640", "Mathematics"),
    ("650", "Mechanical and Aerospace Engineering"),
    ("694", "Molecular Biology and Biochemistry"),
    ("700", "Music"),
    ("705", "Nursing"),
    ("709", "Nutritional Sciences"),
    ("730", "Philosophy"),
    ("750", "Physics and Astronomy"),
    ("762", "Planning and Public Policy"),
    ("790", "Political Science"),
    ("830", "Psychology"),
    ("833", "Public Health"),
    ("840", "Religion"),
    ("860", "Russian"),
    ("920", "Sociology"),
    ("940", "Spanish"),
    ("960", "Statistics"),
    ("965", "Theater Arts"),
    ("988", "Women's and Gender Studies"),
];

/// Letter grade a reviewer received in the class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
    /// Withdrew
    #[serde(rename = "W")]
    W,
    /// Pass (pass/fail)
    #[serde(rename = "P")]
    P,
}

impl Grade {
    pub const ALL: [Grade; 9] = [
        Grade::A,
        Grade::BPlus,
        Grade::B,
        Grade::CPlus,
        Grade::C,
        Grade::D,
        Grade::F,
        Grade::W,
        Grade::P,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::W => "W",
            Grade::P => "P",
        }
    }

    /// Grade-point value used when averaging. W counts as 0, P as 4.
    pub fn points(&self) -> f64 {
        match self {
            Grade::A => 4.0,
            Grade::BPlus => 3.5,
            Grade::B => 3.0,
            Grade::CPlus => 2.5,
            Grade::C => 2.0,
            Grade::D => 1.0,
            Grade::F => 0.0,
            Grade::W => 0.0,
            Grade::P => 4.0,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownOption(s.to_string()))
    }
}

/// Academic term the class was taken in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Fall,
    Spring,
    Winter,
    Summer,
}

impl Term {
    pub const ALL: [Term; 4] = [Term::Fall, Term::Spring, Term::Winter, Term::Summer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Term::Fall => "Fall",
            Term::Spring => "Spring",
            Term::Winter => "Winter",
            Term::Summer => "Summer",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Term {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Term::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownOption(s.to_string()))
    }
}

/// How the class was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    #[serde(rename = "In person")]
    InPerson,
    Hybrid,
    Online,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::InPerson, Location::Hybrid, Location::Online];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::InPerson => "In person",
            Location::Hybrid => "Hybrid",
            Location::Online => "Online",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| UnknownOption(s.to_string()))
    }
}

/// Value outside a fixed option list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption(pub String);

impl fmt::Display for UnknownOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown option: {:?}", self.0)
    }
}

impl std::error::Error for UnknownOption {}

/// Selectable years, newest first: `current_year` and the 29 before it
pub fn year_options(current_year: i32) -> Vec<i32> {
    (0..YEAR_OPTION_COUNT).map(|i| current_year - i).collect()
}

/// Every fixed option list, in the order they are offered
#[derive(Debug, Clone, Serialize)]
pub struct FormOptions {
    pub grades: Vec<&'static str>,
    pub terms: Vec<&'static str>,
    pub years: Vec<i32>,
    pub locations: Vec<&'static str>,
    pub ratings: Vec<&'static str>,
}

impl FormOptions {
    pub fn for_year(current_year: i32) -> Self {
        Self {
            grades: Grade::ALL.iter().map(Grade::as_str).collect(),
            terms: Term::ALL.iter().map(Term::as_str).collect(),
            years: year_options(current_year),
            locations: Location::ALL.iter().map(Location::as_str).collect(),
            ratings: vec!["1", "2", "3", "4", "5"],
        }
    }
}
