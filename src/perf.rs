//! Evaluating and comparing opponents.

use std::{fmt::Display, io::Write, ops::Deref};

use comfy_table::{Cell, Color, ColumnConstraint, Row, Table, Width};
use owo_colors::{AnsiColors, OwoColorize, Stream};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{entity::EntityId, opponent::Opponent, WaifudleError};

/// One solo game played by an opponent in the [test harness](crate::Harness).
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Attempt {
    pub target: EntityId,
    pub target_name: String,
    pub guesses: u32,
    pub solved: bool,
    /// Turns on which the opponent had nothing consistent left to pick from.
    pub fallbacks: u32,
}

/// A record of one opponent's games after run by the
/// [test harness](crate::Harness).
///
/// This struct can provide statistics about the games on its own, but it
/// is recommended to produce [`Summary`] first to cache the computations.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Perf {
    pub(crate) tries: Vec<Attempt>,
    opponent_name: String,
}

impl Perf {
    /// Creates a new empty performance record.
    pub(crate) fn new(opponent: &dyn Opponent) -> Self {
        Perf {
            tries: Vec::new(),
            opponent_name: format!("{} v{}", opponent, opponent.version()),
        }
    }

    /// Gets the name of the opponent that produced this performance record.
    pub fn opponent_name(&self) -> &str {
        &self.opponent_name
    }

    pub fn tries(&self) -> &[Attempt] {
        &self.tries
    }

    /// Gets the number of games played by the opponent.
    pub fn num_tried(&self) -> u32 {
        self.tries.len() as u32
    }

    /// Gets the number of games the opponent won within the guess limit.
    ///
    /// This function always returns a number less than or equal to
    /// [`num_tried()`](Self::num_tried()).
    pub fn num_solved(&self) -> u32 {
        self.tries.iter().filter(|a| a.solved).count() as u32
    }

    /// Gets the number of guesses across all games.
    pub fn cumulative_guesses(&self) -> u32 {
        self.tries.iter().map(|a| a.guesses).sum()
    }

    /// Gets the number of guesses across all solved games.
    pub fn cumulative_guesses_solved(&self) -> u32 {
        self.tries
            .iter()
            .filter(|a| a.solved)
            .map(|a| a.guesses)
            .sum()
    }

    /// Gets the number of turns, across all games, on which the opponent
    /// fell back to a random pick.
    pub fn fallbacks(&self) -> u32 {
        self.tries.iter().map(|a| a.fallbacks).sum()
    }

    /// Gets the average number of guesses needed to win a game.
    ///
    /// This function does not include guesses made in games that the
    /// opponent was unable to win.
    pub fn guesses_per_solution(&self) -> f32 {
        (self.cumulative_guesses_solved() as f32) / (self.num_solved() as f32)
    }

    /// Gets the number of games the opponent could not win.
    pub fn num_missed(&self) -> u32 {
        self.num_tried() - self.num_solved()
    }

    /// Prints the opponent's summary and then a table showing how many
    /// guesses each target took.
    pub fn print(&self) {
        print!("{}", self);
        let mut table = Table::new();
        if !table.is_tty() {
            table.set_table_width(80);
        } else {
            table.load_preset(comfy_table::presets::UTF8_FULL);
        }
        let columns = ((table.get_table_width().unwrap_or(80) / 20) as usize).max(1);
        for chunk in self.tries.chunks(columns) {
            let mut row = Row::new();
            for attempt in chunk {
                let mut cell = Cell::new(format!("{}\n{}", attempt.target_name, attempt.guesses));
                if !attempt.solved {
                    cell = cell.bg(Color::Red).fg(Color::Black);
                } else if attempt.fallbacks > 0 {
                    cell = cell.fg(Color::Yellow);
                }
                row.add_cell(cell);
            }
            table.add_row(row);
        }
        table.set_constraints(vec![
            ColumnConstraint::LowerBoundary(Width::Fixed(8));
            columns
        ]);
        println!("{}", table);
    }

    /// Converts this performance record to a pre-calculated summary.
    pub fn to_summary(&self) -> Summary {
        let histogram: Histogram = self
            .tries
            .iter()
            .filter(|a| a.solved)
            .map(|a| a.guesses)
            .collect();

        debug_assert_eq!(histogram.iter().sum::<u32>(), self.num_solved());

        Summary {
            opponent_name: &self.opponent_name,
            num_tried: self.num_tried(),
            num_solved: self.num_solved(),
            cumulative_guesses: self.cumulative_guesses(),
            fallbacks: self.fallbacks(),
            histogram,
        }
    }
}

impl Display for Perf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_summary())
    }
}

/// A summary of an opponent's performance generated by the
/// [test harness](crate::Harness).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Summary<'a> {
    opponent_name: &'a str,
    num_tried: u32,
    num_solved: u32,
    cumulative_guesses: u32,
    fallbacks: u32,
    histogram: Histogram,
}

impl<'a> Summary<'a> {
    pub fn opponent_name(&self) -> &'a str {
        self.opponent_name
    }

    pub fn num_tried(&self) -> u32 {
        self.num_tried
    }

    pub fn num_solved(&self) -> u32 {
        self.num_solved
    }

    /// Gets the fraction of games won by the opponent.
    pub fn frac_solved(&self) -> f32 {
        (self.num_solved as f32) / (self.num_tried as f32)
    }

    pub fn cumulative_guesses(&self) -> u32 {
        self.cumulative_guesses
    }

    /// Gets the number of guesses across all won games.
    pub fn cumulative_guesses_solved(&self) -> u32 {
        self.histogram
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u32 + 1) * v)
            .sum::<u32>()
    }

    /// Gets the average number of guesses needed to win a game.
    pub fn mean_guesses(&self) -> f32 {
        (self.cumulative_guesses_solved() as f32) / (self.num_solved as f32)
    }

    pub fn num_missed(&self) -> u32 {
        self.num_tried - self.num_solved
    }

    pub fn fallbacks(&self) -> u32 {
        self.fallbacks
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Compares this summary with a baseline's.
    ///
    /// Fails with [`WaifudleError::SelfComparison`] if both are the same.
    pub fn compare<'b>(&self, baseline: &Summary<'b>) -> Result<Comparison<'a, 'b>, WaifudleError> {
        if self == baseline {
            return Err(WaifudleError::SelfComparison);
        }

        Ok(Comparison {
            this: self.clone(),
            baseline: baseline.clone(),
        })
    }

    pub fn print(&self, options: SummaryPrintOptions) -> Result<(), WaifudleError> {
        let mut stdout = std::io::stdout();
        writeln!(stdout, "{:-^80}", self.opponent_name)?;

        match options.compare {
            Some(baseline) => {
                let comparison = self.compare(&baseline)?;

                writeln!(
                    stdout,
                    "Played {} games and comp. with {}, {} games",
                    self.num_tried(),
                    baseline.opponent_name(),
                    baseline.num_tried()
                )?;
                writeln!(
                    stdout,
                    "Won {}, or {:.1}% ({}), and lost {}",
                    self.num_solved(),
                    self.frac_solved() * 100.,
                    format!("{:+.1}%", comparison.frac_solved_diff() * 100.).if_supports_color(
                        Stream::Stdout,
                        |text| {
                            if comparison.frac_solved_diff().is_sign_negative() {
                                text.color(AnsiColors::Red)
                            } else {
                                text.color(AnsiColors::Green)
                            }
                        }
                    ),
                    self.num_missed(),
                )?;
                writeln!(
                    stdout,
                    "Wins took {:.2} ({}) guesses on average",
                    self.mean_guesses(),
                    format!("{:+.2}", comparison.mean_guesses_diff()).if_supports_color(
                        Stream::Stdout,
                        |text| {
                            if comparison.mean_guesses_diff() > 0. {
                                text.color(AnsiColors::Red)
                            } else {
                                text.color(AnsiColors::Green)
                            }
                        }
                    ),
                )?;
            }
            None => {
                writeln!(stdout, "Played {} games", self.num_tried())?;
                writeln!(
                    stdout,
                    "Won {}, or {:.1}%, and lost {}",
                    self.num_solved(),
                    self.frac_solved() * 100.,
                    self.num_missed()
                )?;
                writeln!(
                    stdout,
                    "Wins took {:.2} guesses on average",
                    self.mean_guesses(),
                )?;
            }
        }

        if self.fallbacks > 0 {
            writeln!(
                stdout,
                "{}",
                format!("Fell back to a random pick {} times", self.fallbacks)
                    .if_supports_color(Stream::Stdout, |text| text.bold())
            )?;
        }

        if options.histogram {
            write!(stdout, "{}", self.histogram)?;
        }

        Ok(())
    }

    pub fn print_options() -> SummaryPrintOptions<'a> {
        SummaryPrintOptions::default()
    }
}

#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SummaryPrintOptions<'a> {
    compare: Option<Summary<'a>>,
    histogram: bool,
}

impl<'a> SummaryPrintOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compare(self, baseline: &Summary<'a>) -> Self {
        Self {
            compare: Some(baseline.clone()),
            ..self
        }
    }

    pub fn histogram(self, histogram: bool) -> Self {
        Self { histogram, ..self }
    }
}

impl<'a> Display for Summary<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:-^80}", self.opponent_name)?;
        writeln!(f, "Played {} games", self.num_tried())?;
        writeln!(
            f,
            "Won {}, or {:.1}%, and lost {}",
            self.num_solved(),
            self.frac_solved() * 100.,
            self.num_missed()
        )?;
        writeln!(
            f,
            "Wins took {:.2} guesses on average",
            self.mean_guesses(),
        )
    }
}

/// The differences between an opponent's summary and a baseline's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison<'a, 'b> {
    this: Summary<'a>,
    baseline: Summary<'b>,
}

impl<'a, 'b> Comparison<'a, 'b> {
    pub fn tries_eq(&self) -> bool {
        self.this.num_tried == self.baseline.num_tried
    }

    pub fn frac_solved_diff(&self) -> f32 {
        self.this.frac_solved() - self.baseline.frac_solved()
    }

    /// Positive when this opponent needs more guesses than the baseline.
    pub fn mean_guesses_diff(&self) -> f32 {
        self.this.mean_guesses() - self.baseline.mean_guesses()
    }
}

/// How many won games took each number of guesses.
///
/// Bin `i` counts the games won in `i + 1` guesses.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Histogram {
    bins: Vec<u32>,
}

impl FromIterator<u32> for Histogram {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut bins = Vec::new();
        for guesses in iter.into_iter().filter(|&n| n > 0) {
            let i = guesses as usize - 1;
            if bins.len() <= i {
                bins.resize(i + 1, 0);
            }
            bins[i] += 1;
        }
        Histogram { bins }
    }
}

impl Deref for Histogram {
    type Target = [u32];

    fn deref(&self) -> &Self::Target {
        &self.bins
    }
}

impl Display for Histogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let max = self.iter().copied().max().unwrap_or(0);
        let digits = |n: usize| std::iter::successors(Some(n), |&n| (n >= 10).then(|| n / 10)).count();
        let label = digits(self.len());
        let count_per_mark =
            (max as f32 / (80. - digits(max as usize) as f32 - label as f32 - 5.)).max(1.0);

        for (i, &bin) in self.bins.iter().enumerate() {
            write!(f, "{:>label$} |", i + 1)?;
            let marks = (bin as f32 / count_per_mark).floor() as usize;
            writeln!(f, "{:■>marks$} ({})", "", bin)?;
        }

        Ok(())
    }
}
