use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::errors::{Error, Result};

/// The time coordinate of an array: one timestamp per index along the time
/// axis.
///
/// Regularly spaced axes are built with [`TimeAxis::regular`] or
/// [`TimeAxis::daily`]. Slicing and concatenation can produce irregular
/// axes. Those are representable, but the blocked entry points detect and
/// reject them.
///
#[derive(Clone, Debug, PartialEq)]
pub struct TimeAxis {
    instants: Vec<NaiveDateTime>,
}

impl TimeAxis {
    /// A regularly spaced axis: `start`, `start + step`, and so on, `len`
    /// timestamps in all.
    ///
    pub fn regular(start: NaiveDateTime, step: Duration, len: usize) -> Self {
        let instants = (0..len).map(|i| start + step * (i as i32)).collect();
        Self { instants }
    }

    /// A daily axis covering `[start, end)` at midnight.
    ///
    pub fn daily(start: NaiveDate, end: NaiveDate) -> Self {
        let len = (end - start).num_days().max(0) as usize;
        Self::regular(
            start.and_hms_opt(0, 0, 0).unwrap(),
            Duration::days(1),
            len,
        )
    }

    /// An axis with explicitly given timestamps.
    ///
    pub fn from_instants(instants: Vec<NaiveDateTime>) -> Self {
        Self { instants }
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    pub fn get(&self, index: usize) -> NaiveDateTime {
        self.instants[index]
    }

    pub fn instants(&self) -> &[NaiveDateTime] {
        &self.instants
    }

    /// Copy out the sub-axis covering indices `[start, stop)`.
    ///
    pub fn slice(&self, start: usize, stop: usize) -> Self {
        Self {
            instants: self.instants[start..stop].to_vec(),
        }
    }

    /// Every `step`-th timestamp, starting from the first.
    ///
    pub fn stride(&self, step: usize) -> Self {
        Self {
            instants: self.instants.iter().step_by(step).copied().collect(),
        }
    }

    /// This axis followed by `other`. No ordering or adjacency is enforced,
    /// so the result may be irregular.
    ///
    pub fn concat(&self, other: &TimeAxis) -> Self {
        let mut instants = self.instants.clone();
        instants.extend_from_slice(&other.instants);
        Self { instants }
    }

    /// The spacing between consecutive timestamps, if it is uniform across
    /// the whole axis. Axes with fewer than two timestamps have no step.
    ///
    pub fn step(&self) -> Option<Duration> {
        if self.instants.len() < 2 {
            return None;
        }
        let step = self.instants[1] - self.instants[0];
        for pair in self.instants.windows(2) {
            if pair[1] - pair[0] != step {
                return None;
            }
        }

        Some(step)
    }

    /// Day-of-year group key per timestamp: the 1-based ordinal of the date
    /// within its year. Leap years number through 366, so the same calendar
    /// date can land in different buckets in leap and non-leap years.
    ///
    pub fn dayofyear(&self) -> Vec<i64> {
        self.instants
            .iter()
            .map(|t| t.date().ordinal() as i64)
            .collect()
    }

    /// Month-day group key per timestamp, encoded `month * 100 + day`.
    /// Feb 29 keys as 229 and is never folded into another date.
    ///
    pub fn monthday(&self) -> Vec<i64> {
        self.instants
            .iter()
            .map(|t| (t.date().month() * 100 + t.date().day()) as i64)
            .collect()
    }

    /// Split the axis into one run per calendar year, returning the run
    /// lengths (365 or 366).
    ///
    /// The axis must be daily with no gaps and must span whole years,
    /// starting on a Jan 1 and ending on a Dec 31.
    ///
    pub fn year_chunks(&self) -> Result<Vec<usize>> {
        if self.is_empty() {
            return Err(Error::IrregularAxis("time axis is empty".into()));
        }
        match self.step() {
            Some(step) if step == Duration::days(1) => {}
            Some(step) => {
                return Err(Error::IrregularAxis(format!(
                    "expected a one day step, found {step}"
                )));
            }
            None => {
                return Err(Error::IrregularAxis(
                    "timestamps are not evenly spaced".into(),
                ));
            }
        }

        let start = self.instants[0];
        let end = *self.instants.last().unwrap();
        let whole = start.date().ordinal() == 1
            && end.date().month() == 12
            && end.date().day() == 31;
        if !whole {
            return Err(Error::PartialYear { start, end });
        }

        let mut runs = vec![];
        let mut year = start.date().year();
        let mut count = 0;
        for instant in &self.instants {
            if instant.date().year() != year {
                runs.push(count);
                year = instant.date().year();
                count = 0;
            }
            count += 1;
        }
        runs.push(count);

        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily() {
        let axis = TimeAxis::daily(date(2002, 1, 1), date(2005, 1, 1));
        assert_eq!(axis.len(), 1096);
        assert_eq!(axis.get(0).date(), date(2002, 1, 1));
        assert_eq!(axis.get(1095).date(), date(2004, 12, 31));
        assert_eq!(axis.step(), Some(Duration::days(1)));
    }

    #[test]
    fn test_regular_hourly() {
        let start = date(2002, 1, 1).and_hms_opt(0, 0, 0).unwrap();
        let axis = TimeAxis::regular(start, Duration::hours(1), 48);
        assert_eq!(axis.len(), 48);
        assert_eq!(axis.get(24).date(), date(2002, 1, 2));
        assert_eq!(axis.step(), Some(Duration::hours(1)));
    }

    #[test]
    fn test_concat_gap_is_irregular() {
        let daily = TimeAxis::daily(date(2002, 1, 1), date(2003, 1, 1));
        let gapped = daily.slice(0, 15).concat(&daily.slice(17, 26));
        assert_eq!(gapped.len(), 24);
        assert_eq!(gapped.step(), None);
    }

    #[test]
    fn test_dayofyear_keys() {
        let axis = TimeAxis::daily(date(2004, 1, 1), date(2005, 1, 1));
        let keys = axis.dayofyear();
        assert_eq!(keys[0], 1);
        assert_eq!(keys[59], 60); // Feb 29
        assert_eq!(keys[365], 366); // Dec 31 of a leap year

        let axis = TimeAxis::daily(date(2002, 1, 1), date(2003, 1, 1));
        let keys = axis.dayofyear();
        assert_eq!(keys[59], 60); // Mar 1 shares the Feb 29 bucket
        assert_eq!(keys[364], 365);
    }

    #[test]
    fn test_monthday_keys() {
        let axis = TimeAxis::daily(date(2004, 1, 1), date(2005, 1, 1));
        let keys = axis.monthday();
        assert_eq!(keys[0], 101);
        assert_eq!(keys[59], 229); // Feb 29 keeps its own bucket
        assert_eq!(keys[60], 301);
        assert_eq!(keys[365], 1231);
    }

    #[test]
    fn test_year_chunks() {
        let axis = TimeAxis::daily(date(2002, 1, 1), date(2005, 1, 1));
        assert_eq!(axis.year_chunks().unwrap(), vec![365, 365, 366]);
    }

    #[test]
    fn test_year_chunks_partial_year() {
        let axis = TimeAxis::daily(date(2002, 1, 2), date(2003, 1, 1));
        assert!(matches!(
            axis.year_chunks(),
            Err(Error::PartialYear { .. })
        ));

        let axis = TimeAxis::daily(date(2002, 1, 1), date(2002, 12, 31));
        assert!(matches!(
            axis.year_chunks(),
            Err(Error::PartialYear { .. })
        ));
    }

    #[test]
    fn test_year_chunks_irregular() {
        let daily = TimeAxis::daily(date(2002, 1, 1), date(2003, 1, 1));
        let gapped = daily.slice(0, 15).concat(&daily.slice(17, 365));
        assert!(matches!(
            gapped.year_chunks(),
            Err(Error::IrregularAxis(_))
        ));

        let start = date(2002, 1, 1).and_hms_opt(0, 0, 0).unwrap();
        let hourly = TimeAxis::regular(start, Duration::hours(1), 8760);
        assert!(matches!(
            hourly.year_chunks(),
            Err(Error::IrregularAxis(_))
        ));
    }
}
