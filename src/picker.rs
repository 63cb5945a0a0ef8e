use crate::model::Student;
use rand::Rng;
use serde::Serialize;

pub const DEFAULT_SPINS: usize = 20;
/// Upper bound on draws per pick; larger requests are clamped.
pub const MAX_SPINS: usize = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    /// Every index drawn, in order; the last one is the pick.
    pub draws: Vec<usize>,
    pub student: Student,
}

/// Draws a uniform index `spins` times (between 1 and `MAX_SPINS`) and keeps
/// the last.
pub fn pick_random<R: Rng + ?Sized>(students: &[Student], spins: usize, rng: &mut R) -> Option<Pick> {
    if students.is_empty() {
        return None;
    }
    let draws: Vec<usize> = (0..spins.clamp(1, MAX_SPINS))
        .map(|_| rng.gen_range(0..students.len()))
        .collect();
    let last = *draws.last()?;
    Some(Pick {
        student: students[last].clone(),
        draws,
    })
}
