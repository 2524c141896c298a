use std::future::Future;

use rand::Rng;

/// 32 symbols, visually ambiguous characters (0/O, 1/I and lowercase l)
/// excluded.
pub const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Booking codes are exactly this long: 32^5 ~ 33.5M possible codes.
pub const CODE_LEN: usize = 5;

/// How many insert attempts a single booking request gets before the
/// collision is treated as an internal fault.
pub const RETRY_BUDGET: usize = 3;

/// Generate a fresh short booking code, symbols drawn independently and
/// uniformly from [`ALPHABET`].
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug)]
pub enum AllocError<E> {
    /// Every attempt in the budget hit a code collision.
    Exhausted,
    /// The insert failed for a reason other than a code collision.
    Other(E),
}

/// Outcome of a single insert attempt, classified by the caller.
#[derive(Debug)]
pub enum Attempt<T, E> {
    Inserted(T),
    /// The generated code already exists; try again with a fresh one.
    DuplicateCode,
    Failed(E),
}

/// Run `attempt` with a freshly generated code, retrying on code
/// collisions up to [`RETRY_BUDGET`] times in total. Collisions are
/// expected to be vanishingly rare, but the bound keeps a pathological
/// id-space state from looping forever.
pub async fn insert_with_code_retry<T, E, F, Fut>(mut attempt: F) -> Result<T, AllocError<E>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    for _ in 0..RETRY_BUDGET {
        match attempt(generate()).await {
            Attempt::Inserted(value) => return Ok(value),
            Attempt::DuplicateCode => continue,
            Attempt::Failed(err) => return Err(AllocError::Other(err)),
        }
    }
    Err(AllocError::Exhausted)
}
