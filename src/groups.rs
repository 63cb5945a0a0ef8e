use crate::model::Student;
use rand::seq::SliceRandom;
use rand::Rng;

/// Splits the roster into `group_count` groups (at least one).
///
/// Flagged and unflagged students are shuffled separately; flagged students
/// are dealt round-robin first and the same counter carries on through the
/// unflagged ones, so flagged students land in distinct groups while there
/// are groups left to receive them.
pub fn generate_groups<R: Rng + ?Sized>(
    students: &[Student],
    group_count: usize,
    rng: &mut R,
) -> Vec<Vec<Student>> {
    let k = group_count.max(1);
    let mut groups: Vec<Vec<Student>> = vec![Vec::new(); k];

    let (mut flagged, mut unflagged): (Vec<&Student>, Vec<&Student>) =
        students.iter().partition(|s| s.is_flagged);
    flagged.shuffle(rng);
    unflagged.shuffle(rng);

    let mut current = 0usize;
    for student in flagged.into_iter().chain(unflagged) {
        groups[current].push(student.clone());
        current = (current + 1) % k;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn roster(n: usize, flagged: usize) -> Vec<Student> {
        (0..n)
            .map(|i| Student {
                id: format!("s{i}"),
                is_flagged: i < flagged,
                ..Student::new(format!("Student {i}"), (i + 1).to_string())
            })
            .collect()
    }

    #[test]
    fn sizes_sum_to_roster_and_everyone_appears_once() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in 0..20 {
            for k in 1..8 {
                let students = roster(n, n / 3);
                let groups = generate_groups(&students, k, &mut rng);
                assert_eq!(groups.len(), k);
                assert_eq!(groups.iter().map(Vec::len).sum::<usize>(), n);
                let ids: HashSet<&str> = groups.iter().flatten().map(|s| s.id.as_str()).collect();
                assert_eq!(ids.len(), n);
                let max = groups.iter().map(Vec::len).max().unwrap_or(0);
                let min = groups.iter().map(Vec::len).min().unwrap_or(0);
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn flagged_students_are_dealt_first() {
        let students = roster(5, 2);
        let mut rng = StdRng::seed_from_u64(9);
        let groups = generate_groups(&students, 2, &mut rng);
        assert_eq!(groups[0].len() + groups[1].len(), 5);
        assert!(groups[0][0].is_flagged);
        assert!(groups[1][0].is_flagged);
        assert!(groups.iter().all(|g| g.iter().filter(|s| s.is_flagged).count() == 1));
    }

    #[test]
    fn flagged_spread_evenly_across_groups() {
        let students = roster(12, 7);
        let mut rng = StdRng::seed_from_u64(5);
        let groups = generate_groups(&students, 3, &mut rng);
        let counts: Vec<usize> = groups
            .iter()
            .map(|g| g.iter().filter(|s| s.is_flagged).count())
            .collect();
        assert_eq!(counts, vec![3, 2, 2]);
    }

    #[test]
    fn zero_groups_is_clamped_and_extra_groups_stay_empty() {
        let students = roster(3, 0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(generate_groups(&students, 0, &mut rng).len(), 1);
        let groups = generate_groups(&students, 5, &mut rng);
        assert_eq!(groups.len(), 5);
        assert!(groups[3].is_empty() && groups[4].is_empty());
        assert!(generate_groups(&[], 3, &mut rng).iter().all(Vec::is_empty));
    }
}
