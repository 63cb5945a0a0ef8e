use crate::model::Student;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Seat id -> student id.
pub type SeatingLayout = BTreeMap<String, String>;

const SEAT_PREFIX: &str = "seat-";

/// Seats laid out row-major, sized to the roster. The last row may be short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatGrid {
    pub rows: usize,
    pub cols: usize,
    pub seats: usize,
}

impl SeatGrid {
    pub fn for_roster(students: usize) -> Self {
        let mut cols = 1usize;
        while cols * cols < students {
            cols += 1;
        }
        let rows = students.div_ceil(cols).max(1);
        Self {
            rows,
            cols,
            seats: students,
        }
    }

    pub fn seat_id(index: usize) -> String {
        format!("{SEAT_PREFIX}{index}")
    }

    pub fn parse_seat_id(id: &str) -> Option<usize> {
        id.strip_prefix(SEAT_PREFIX)?.parse().ok()
    }

    pub fn position(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.seats
    }

    /// The up-to-eight seats around `index` that exist in this grid.
    pub fn neighbours(&self, index: usize) -> Vec<usize> {
        let (r, c) = self.position(index);
        let mut out = Vec::with_capacity(8);
        for dr in -1i64..=1 {
            for dc in -1i64..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let nr = r as i64 + dr;
                let nc = c as i64 + dc;
                if nr < 0 || nc < 0 || nr >= self.rows as i64 || nc >= self.cols as i64 {
                    continue;
                }
                let adj = nr as usize * self.cols + nc as usize;
                if self.contains(adj) {
                    out.push(adj);
                }
            }
        }
        out
    }
}

pub fn seat_of<'a>(layout: &'a SeatingLayout, student_id: &str) -> Option<&'a str> {
    layout
        .iter()
        .find(|(_, sid)| sid.as_str() == student_id)
        .map(|(seat, _)| seat.as_str())
}

/// Manual placement. A student moves out of any seat they held before; the
/// previous occupant of the target seat is left unseated, not swapped.
/// `None` clears the seat.
pub fn place_student(layout: &mut SeatingLayout, seat_id: &str, student_id: Option<&str>) {
    match student_id {
        Some(sid) => {
            layout.retain(|_, v| v != sid);
            layout.insert(seat_id.to_string(), sid.to_string());
        }
        None => {
            layout.remove(seat_id);
        }
    }
}

pub fn unseated<'a>(students: &'a [Student], layout: &SeatingLayout) -> Vec<&'a Student> {
    let seated: HashSet<&str> = layout.values().map(String::as_str).collect();
    students
        .iter()
        .filter(|s| !seated.contains(s.id.as_str()))
        .collect()
}

#[derive(Debug, Clone)]
pub struct AutoFill {
    pub layout: SeatingLayout,
    pub placed: usize,
    /// Flagged students that had to sit next to another flagged student.
    pub fallbacks: usize,
}

/// Seats every unseated student into the empty seats of the roster-sized grid.
///
/// Flagged students go first, each into the first empty seat (in shuffled
/// order) with no flagged neighbour, or the first empty seat at all when no
/// such seat is left. Unflagged students then take the remaining seats in
/// shuffled order. Existing assignments are kept.
pub fn auto_fill<R: Rng + ?Sized>(
    students: &[Student],
    layout: &SeatingLayout,
    rng: &mut R,
) -> AutoFill {
    let grid = SeatGrid::for_roster(students.len());
    let flagged_ids: HashSet<&str> = students
        .iter()
        .filter(|s| s.is_flagged)
        .map(|s| s.id.as_str())
        .collect();

    let (mut flagged, mut unflagged): (Vec<&Student>, Vec<&Student>) =
        unseated(students, layout).into_iter().partition(|s| s.is_flagged);
    flagged.shuffle(rng);
    unflagged.shuffle(rng);

    let mut empty: Vec<usize> = (0..grid.seats)
        .filter(|i| !layout.contains_key(&SeatGrid::seat_id(*i)))
        .collect();
    empty.shuffle(rng);

    let mut out = layout.clone();
    let mut placed = 0usize;
    let mut fallbacks = 0usize;

    let touches_flagged = |index: usize, current: &SeatingLayout| {
        grid.neighbours(index).into_iter().any(|adj| {
            current
                .get(&SeatGrid::seat_id(adj))
                .map(|sid| flagged_ids.contains(sid.as_str()))
                .unwrap_or(false)
        })
    };

    for student in flagged {
        if empty.is_empty() {
            break;
        }
        let pos = match empty.iter().position(|&i| !touches_flagged(i, &out)) {
            Some(p) => p,
            None => {
                fallbacks += 1;
                tracing::debug!(student = %student.id, "no separated seat left, using first free seat");
                0
            }
        };
        let seat = empty.remove(pos);
        out.insert(SeatGrid::seat_id(seat), student.id.clone());
        placed += 1;
    }

    for student in unflagged {
        if empty.is_empty() {
            break;
        }
        let seat = empty.remove(0);
        out.insert(SeatGrid::seat_id(seat), student.id.clone());
        placed += 1;
    }

    AutoFill {
        layout: out,
        placed,
        fallbacks,
    }
}
