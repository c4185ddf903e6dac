// Draft order generation: one uniform shuffle of the registered team names.

use rand::seq::SliceRandom;
use rand::Rng;

use super::error::DraftError;

/// Produce the base rotation for a draft: a uniformly-random permutation of
/// the registered team names.
///
/// Runs exactly once per draft instance, at start time. The roster must be
/// full: `teams.len()` must equal `expected`, otherwise
/// [`DraftError::PreconditionFailed`] is returned and nothing is shuffled.
pub fn generate(teams: &[String], expected: usize) -> Result<Vec<String>, DraftError> {
    generate_with_rng(teams, expected, &mut rand::thread_rng())
}

/// Same as [`generate`] but with an injected RNG so tests can be
/// deterministic.
pub fn generate_with_rng<R: Rng>(
    teams: &[String],
    expected: usize,
    rng: &mut R,
) -> Result<Vec<String>, DraftError> {
    if teams.len() != expected {
        return Err(DraftError::PreconditionFailed {
            expected,
            actual: teams.len(),
        });
    }
    let mut order: Vec<String> = teams.to_vec();
    order.shuffle(rng);
    Ok(order)
}
