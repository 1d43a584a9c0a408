use chrono::{Datelike, NaiveDate};
use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatePart {
    Day,
    Month,
    Year,
}

impl DatePart {
    fn width(self) -> usize {
        match self {
            DatePart::Day | DatePart::Month => 2,
            DatePart::Year => 4,
        }
    }
}

/// Segment-by-segment editor for the memo date (DD/MM/YYYY).
pub struct DateInputState {
    pub date: NaiveDate,
    pub editing: bool,
    pub date_part: DatePart,
    pub current_date_input: String,
}

impl DateInputState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            editing: false,
            date_part: DatePart::Day,
            current_date_input: String::new(),
        }
    }

    pub fn start_editing(&mut self, date: NaiveDate) {
        self.date = date;
        self.editing = true;
        self.date_part = DatePart::Day;
        self.current_date_input.clear();
    }

    pub fn stop_editing(&mut self) {
        self.editing = false;
        self.current_date_input.clear();
    }

    pub fn next_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Day => DatePart::Month,
            DatePart::Month => DatePart::Year,
            DatePart::Year => DatePart::Day,
        };
        self.current_date_input.clear();
    }

    pub fn previous_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Day => DatePart::Year,
            DatePart::Month => DatePart::Day,
            DatePart::Year => DatePart::Month,
        };
        self.current_date_input.clear();
    }

    pub fn handle_input(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.current_date_input.push(c);
                if self.current_date_input.len() == self.date_part.width() {
                    self.apply_segment();
                    self.current_date_input.clear();
                    self.next_date_part();
                }
            }
            KeyCode::Backspace => {
                self.current_date_input.pop();
            }
            KeyCode::Right => self.next_date_part(),
            KeyCode::Left => self.previous_date_part(),
            _ => {}
        }
    }

    // Impossible dates (31/02, month 13) leave the date as it was
    fn apply_segment(&mut self) {
        let Ok(value) = self.current_date_input.parse::<u32>() else {
            return;
        };

        let (year, month, day) = (self.date.year(), self.date.month(), self.date.day());
        let candidate = match self.date_part {
            DatePart::Day => NaiveDate::from_ymd_opt(year, month, value),
            DatePart::Month => NaiveDate::from_ymd_opt(year, value, day),
            DatePart::Year if (1900..=2100).contains(&value) => {
                NaiveDate::from_ymd_opt(value as i32, month, day)
            }
            DatePart::Year => None,
        };

        if let Some(date) = candidate {
            self.date = date;
        }
    }

    pub fn get_display_string(&self) -> String {
        let day = format!("{:02}", self.date.day());
        let month = format!("{:02}", self.date.month());
        let year = format!("{:04}", self.date.year());

        if !self.editing {
            return format!("{}/{}/{}", day, month, year);
        }

        let marker = if self.current_date_input.is_empty() {
            match self.date_part {
                DatePart::Day => "[DD]".to_string(),
                DatePart::Month => "[MM]".to_string(),
                DatePart::Year => "[YYYY]".to_string(),
            }
        } else {
            format!("[{}]", self.current_date_input)
        };

        match self.date_part {
            DatePart::Day => format!("{}{}/{}/{}", day, marker, month, year),
            DatePart::Month => format!("{}/{}{}/{}", day, month, marker, year),
            DatePart::Year => format!("{}/{}/{}{}", day, month, year, marker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing(date: NaiveDate) -> DateInputState {
        let mut state = DateInputState::new(date);
        state.start_editing(date);
        state
    }

    fn type_digits(state: &mut DateInputState, digits: &str) {
        for c in digits.chars() {
            state.handle_input(KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_each_segment_moves_along() {
        let mut state = editing(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        type_digits(&mut state, "25");
        assert_eq!(state.date_part, DatePart::Month);
        type_digits(&mut state, "12");
        type_digits(&mut state, "2023");

        assert_eq!(state.date, NaiveDate::from_ymd_opt(2023, 12, 25).unwrap());
        assert_eq!(state.date_part, DatePart::Day);
    }

    #[test]
    fn impossible_day_is_ignored() {
        let mut state = editing(NaiveDate::from_ymd_opt(2023, 2, 10).unwrap());
        type_digits(&mut state, "30");
        assert_eq!(state.date, NaiveDate::from_ymd_opt(2023, 2, 10).unwrap());
    }

    #[test]
    fn leap_day_accepted_only_in_leap_years() {
        let mut state = editing(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        type_digits(&mut state, "29");
        assert_eq!(state.date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        state.date_part = DatePart::Year;
        type_digits(&mut state, "2023");
        assert_eq!(state.date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn display_marks_the_active_segment() {
        let mut state = DateInputState::new(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(state.get_display_string(), "05/03/2024");

        state.start_editing(state.date);
        state.handle_input(KeyCode::Right);
        assert_eq!(state.get_display_string(), "05/03[MM]/2024");
        state.handle_input(KeyCode::Char('1'));
        assert_eq!(state.get_display_string(), "05/03[1]/2024");
    }

    #[test]
    fn ignores_keys_when_not_editing() {
        let mut state = DateInputState::new(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        type_digits(&mut state, "11");
        assert_eq!(state.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }
}
