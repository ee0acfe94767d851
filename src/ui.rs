use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Paragraph, Widget, Wrap},
};

use crate::trial::{Phase, TrialOutcome};
use crate::util::format_reaction_ms;
use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

// Phase themes: neutral grey, anticipation orange, go green, and the
// red/white false-start flash
const NEUTRAL_BG: Color = Color::Gray;
const WAITING_BG: Color = Color::Rgb(255, 165, 0);
const SIGNAL_BG: Color = Color::LightGreen;
const FALSE_START_BG: Color = Color::Red;

fn theme(phase: Phase, outcome: Option<TrialOutcome>) -> (Color, Color) {
    match (phase, outcome) {
        (Phase::Waiting, _) => (WAITING_BG, Color::Black),
        (Phase::Signal, _) => (SIGNAL_BG, Color::Black),
        (Phase::Result, Some(TrialOutcome::FalseStart)) => (FALSE_START_BG, Color::White),
        _ => (NEUTRAL_BG, Color::Black),
    }
}

fn instruction_text(phase: Phase, outcome: Option<TrialOutcome>, mouse: bool) -> String {
    match (phase, outcome) {
        (Phase::Idle, _) => {
            if mouse {
                "Press enter to arm the trial, then hit space\nor click as soon as the screen turns green".into()
            } else {
                "Press enter to arm the trial, then hit space\nas soon as the screen turns green".into()
            }
        }
        (Phase::Waiting, _) => "Get ready... wait for green".into(),
        (Phase::Signal, _) => "Go! Press now!".into(),
        (Phase::Result, Some(TrialOutcome::FalseStart)) => {
            "Too soon! That press came before the signal.\nPress enter to try again".into()
        }
        (Phase::Result, _) => "Done. Press enter to go again".into(),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let phase = self.trial.phase();
        let outcome = self.trial.outcome();
        let (bg, fg) = theme(phase, outcome);

        buf.set_style(area, Style::default().bg(bg).fg(fg));

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_italic_style = Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(
                [
                    Constraint::Min(1),    // top padding
                    Constraint::Length(2), // instructions
                    Constraint::Length(1),
                    Constraint::Length(1), // result line
                    Constraint::Length(2),
                    Constraint::Length(1), // start control
                    Constraint::Min(1),    // bottom padding
                    Constraint::Length(1), // footer
                ]
                .as_ref(),
            )
            .split(area);

        let instructions = Paragraph::new(instruction_text(phase, outcome, self.config.mouse))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        instructions.render(chunks[1], buf);

        if let Some(TrialOutcome::Reaction(elapsed)) = outcome {
            let result = Paragraph::new(Span::styled(
                format!("reaction time: {} ms", format_reaction_ms(elapsed)),
                bold_style,
            ))
            .alignment(Alignment::Center);
            result.render(chunks[3], buf);
        }

        // The start control only exists between trials
        if matches!(phase, Phase::Idle | Phase::Result) {
            let start = Paragraph::new(Span::styled("[ enter ] start", bold_style))
                .alignment(Alignment::Center);
            start.render(chunks[5], buf);
        }

        let footer = Paragraph::new(Span::styled(
            format!("{} / (esc) quit", phase),
            dim_italic_style,
        ));
        footer.render(chunks[7], buf);
    }
}
