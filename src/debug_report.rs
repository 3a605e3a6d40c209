use riglogic::{ConfidenceLevel, ManifestGroup, MatchResult, MatchSignal, Resolution, RuleDiagnostics};
use std::io::{self, Write};

mod ansi {
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RED: &str = "\x1b[31m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    const RESET: &str = "\x1b[0m";
    const DIM: &str = "\x1b[2m";
    const BOLD: &str = "\x1b[1m";

    /// Wraps text in SGR codes when color is on; a no-op otherwise.
    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        fn wrap(&self, s: impl AsRef<str>, code: &str) -> String {
            match self.enabled {
                true => format!("{code}{}{RESET}", s.as_ref()),
                false => s.as_ref().to_string(),
            }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            self.wrap(s, color)
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            self.wrap(s, BOLD)
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            self.wrap(s, DIM)
        }
    }
}

/// Everything one CLI run produced.
pub struct Report<'a> {
    pub model: &'a str,
    pub confirmed: &'a [String],
    pub resolution: &'a Resolution,
    pub manifest: &'a [ManifestGroup<'a>],
    pub diagnostics: &'a RuleDiagnostics,
    pub matches: &'a [MatchResult],
}

pub fn print_report(out: &mut impl Write, report: &Report<'_>, color: bool) -> io::Result<()> {
    let palette = ansi::Palette::new(color);
    let title = if report.model.is_empty() { "catalog".to_string() } else { report.model.to_string() };
    writeln!(out, "\n{}", palette.bold(palette.paint(format!("⚙  Configuring: {title}"), ansi::CYAN)))?;

    writeln!(out, "\n{}", palette.paint("━━━ Resolution ━━━", ansi::GRAY))?;
    print_resolution(out, report, &palette)?;

    writeln!(out, "\n{}", palette.paint("━━━ Manifest ━━━", ansi::GRAY))?;
    print_manifest(out, report.manifest, &palette)?;

    writeln!(out, "\n{}", palette.paint("━━━ Rule diagnostics ━━━", ansi::GRAY))?;
    print_diagnostics(out, report.diagnostics, &palette)?;

    if !report.matches.is_empty() {
        writeln!(out, "\n{}", palette.paint("━━━ Matches ━━━", ansi::GRAY))?;
        print_matches(out, report.matches, &palette)?;
    }

    writeln!(out, "\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY))?;
    writeln!(
        out,
        "  Total: {}  │  Passes: {}",
        palette.paint(format!("{:?}", report.resolution.metrics.total), ansi::GREEN),
        palette.paint(report.resolution.metrics.passes.len().to_string(), ansi::CYAN),
    )?;
    writeln!(out)
}

fn print_resolution(out: &mut impl Write, report: &Report<'_>, palette: &ansi::Palette) -> io::Result<()> {
    let resolution = report.resolution;
    let confirmed = if report.confirmed.is_empty() { palette.dim("(none)") } else { report.confirmed.join(", ") };
    writeln!(out, "  {} {}", palette.dim("confirmed:"), confirmed)?;

    for (idx, pass) in resolution.metrics.passes.iter().enumerate() {
        writeln!(
            out,
            "  {} {}  {}",
            palette.paint(format!("Pass {}:", idx + 1), ansi::BLUE),
            if pass.implied.is_empty() {
                palette.dim("✗ nothing implied")
            } else {
                palette.paint(format!("✓ {}", pass.implied.join(", ")), ansi::GREEN)
            },
            palette.dim(format!(
                "context {} │ evaluated {} │ group-skipped {} │ {:?}",
                pass.context_size, pass.rules_evaluated, pass.rules_group_skipped, pass.duration
            )),
        )?;
    }

    let status = if resolution.converged {
        palette.paint("converged", ansi::GREEN)
    } else {
        palette.paint("pass limit reached; result may be incomplete", ansi::RED)
    };
    writeln!(out, "  {} {}", palette.dim("status:"), status)
}

fn print_manifest(out: &mut impl Write, manifest: &[ManifestGroup<'_>], palette: &ansi::Palette) -> io::Result<()> {
    if manifest.is_empty() {
        return writeln!(out, "{}", palette.dim("  No parts selected"));
    }
    for group in manifest {
        let label = if group.ref_des.is_empty() { "(no ref-des)" } else { group.ref_des.as_str() };
        writeln!(out, "  {}", palette.bold(palette.paint(label, ansi::BLUE)))?;
        for part in &group.parts {
            writeln!(
                out,
                "    {} {} {}",
                palette.paint(&part.id, ansi::CYAN),
                palette.dim("│"),
                if part.part_number.is_empty() { palette.dim(&part.name) } else { format!("{} {}", part.part_number, part.name) },
            )?;
        }
    }
    Ok(())
}

fn print_diagnostics(out: &mut impl Write, diagnostics: &RuleDiagnostics, palette: &ansi::Palette) -> io::Result<()> {
    if diagnostics.is_clean() {
        return writeln!(out, "{}", palette.dim("  No issues"));
    }
    let lists = [
        ("always fires:", &diagnostics.always_fires),
        ("dangling target:", &diagnostics.dangling),
        ("inactive:", &diagnostics.inactive),
    ];
    for (label, ids) in lists {
        if !ids.is_empty() {
            writeln!(out, "  {} {}", palette.paint(label, ansi::YELLOW), ids.join(", "))?;
        }
    }
    for (rule, issue) in &diagnostics.expression_issues {
        writeln!(out, "  {} {} {}", palette.paint("malformed:", ansi::YELLOW), palette.paint(rule, ansi::CYAN), issue)?;
    }
    Ok(())
}

fn print_matches(out: &mut impl Write, matches: &[MatchResult], palette: &ansi::Palette) -> io::Result<()> {
    for (idx, result) in matches.iter().enumerate() {
        let color = match result.confidence_level {
            ConfidenceLevel::AutoVerified => ansi::GREEN,
            ConfidenceLevel::ReviewNeeded => ansi::YELLOW,
            ConfidenceLevel::Uncertain => ansi::RED,
        };
        writeln!(
            out,
            "  {} {} = {}",
            palette.paint(format!("[{}]", idx), ansi::GRAY),
            palette.bold(&result.category),
            result.selection,
        )?;
        let matched = match (&result.matched_part_id, &result.matched_part_number) {
            (Some(id), Some(number)) if !number.is_empty() => format!("{id} ({number})"),
            (Some(id), _) => id.clone(),
            (None, _) => "no match".to_string(),
        };
        writeln!(
            out,
            "      {} {}  {} {}  {}",
            palette.dim("part:"),
            palette.paint(matched, ansi::CYAN),
            palette.dim("│ score:"),
            palette.paint(format!("{:.2} {:?}", result.confidence_score, result.confidence_level), color),
            palette.dim(signal_name(result.signal)),
        )?;
    }
    Ok(())
}

fn signal_name(signal: MatchSignal) -> &'static str {
    match signal {
        MatchSignal::PartNumber => "via part number",
        MatchSignal::Knowledge => "via knowledge",
        MatchSignal::Overlap => "via token overlap",
        MatchSignal::None => "",
    }
}
