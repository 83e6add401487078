use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;

use crate::grading::{CaseResult, CaseVerdict, SubjectRun};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal $(, $e:expr)* $(,)?) => {{
        use ::colored::Colorize as _;
        println!("{}", format!($fmt $(, $e)*).green())
    }};
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    match v.as_str() {
        "truecolor" | "24bit" => true,
        _ => false,
    }
}

/// Display label of one graded case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CaseStatus {
    Pass,
    Part,
    Fail,
    Tle,
    Err,
}

impl CaseStatus {
    pub fn of(verdict: &CaseVerdict) -> Self {
        match verdict {
            CaseVerdict::Graded(v) if v.is_full() => Self::Pass,
            CaseVerdict::Graded(v) if v.passed => Self::Part,
            CaseVerdict::Graded(_) => Self::Fail,
            CaseVerdict::TimedOut => Self::Tle,
            CaseVerdict::NonZeroExit(_) | CaseVerdict::SpawnError => Self::Err,
        }
    }
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for CaseStatus {
    fn color(&self) -> Color {
        use CaseStatus::*;
        if !self::is_truecolor_supported() {
            return match self {
                Pass => Color::Green,
                Part => Color::Yellow,
                Fail => Color::Red,
                Tle => Color::Blue,
                Err => Color::Magenta,
            };
        }

        match self {
            Pass => Color::TrueColor {
                r: 30,
                g: 180,
                b: 40,
            },
            Part => Color::TrueColor {
                r: 210,
                g: 138,
                b: 4,
            },
            Fail => Color::TrueColor {
                r: 220,
                g: 42,
                b: 42,
            },
            Tle => Color::TrueColor {
                r: 52,
                g: 120,
                b: 246,
            },
            Err => Color::TrueColor {
                r: 171,
                g: 40,
                b: 200,
            },
        }
    }
}

pub fn case_badge(status: CaseStatus) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", status)
        .on_color(status.color())
        .bold()
        .color(fg)
}

pub fn print_case_detail(res: &CaseResult) {
    let (cols, _) = terminal::size().unwrap_or((40, 40));

    const BOLD_LINE: &str = "━";
    const THIN_LINE: &str = "─";

    let bold_bar = BOLD_LINE.repeat(cols as usize).blue().bold();

    let status = CaseStatus::of(&res.verdict);
    println!(
        "\n{}: {} [{}ms]\n{}",
        format!("Test {}", res.index).color(Color::BrightYellow).bold(),
        case_badge(status),
        res.execution_time.as_millis(),
        bold_bar,
    );

    fn print_sub_title(s: &str, cols: usize) {
        println!(
            "{}{}",
            s.cyan().bold(),
            THIN_LINE
                .repeat(cols.saturating_sub(s.len() + 1))
                .bright_black(),
        )
    }

    match &res.verdict {
        CaseVerdict::Graded(v) => {
            print_sub_title("[expected]", cols as usize);
            println!("{}", v.expected_repr.as_deref().unwrap_or(r#""""#));
            print_sub_title("[actual]", cols as usize);
            println!("{}", v.actual_repr.as_deref().unwrap_or(r#""""#));
        }
        CaseVerdict::TimedOut => println!("time out"),
        CaseVerdict::NonZeroExit(Some(code)) => println!("exit code {}", code),
        CaseVerdict::NonZeroExit(None) => println!("terminated by signal"),
        CaseVerdict::SpawnError => println!("could not launch the program"),
    }

    if !res.stderr.is_empty() {
        print_sub_title("[stderr]", cols as usize);
        print!("{}", res.stderr);
        if !res.stderr.ends_with('\n') {
            println!();
        }
    }

    println!("{}", bold_bar);
}

pub fn print_run_summary(run: &SubjectRun) {
    let total = run.total_score();
    let max = run.num_cases as f64;

    let msg = format!("Total score of {}: {:.1} / {:.1}", run.subject, total, max);
    let msg = if total >= max {
        msg.green()
    } else if total > 0.0 {
        msg.yellow()
    } else {
        msg.bright_red()
    };
    println!("{}", msg);
    println!();
}
