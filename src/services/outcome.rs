use rand::Rng;

use crate::{
    constants::{GUESS_MAX, GUESS_MIN},
    models::Prediction,
};

/// Draws the gateway's own winning number for a play. The contract's draw is
/// authoritative; this value is only reported next to the submission.
pub struct OutcomePredictor;

impl OutcomePredictor {
    pub fn predict(guess: u8) -> Prediction {
        Self::predict_with(&mut rand::rng(), guess)
    }

    pub fn predict_with<R: Rng>(rng: &mut R, guess: u8) -> Prediction {
        let winning_number = rng.random_range(GUESS_MIN..=GUESS_MAX);
        Prediction {
            winning_number,
            win: winning_number == guess,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn draws_stay_in_guess_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let p = OutcomePredictor::predict_with(&mut rng, 5);
            assert!((GUESS_MIN..=GUESS_MAX).contains(&p.winning_number));
            assert_eq!(p.win, p.winning_number == 5);
        }
    }

    #[test]
    fn every_number_can_win() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; 10];
        for _ in 0..2_000 {
            let p = OutcomePredictor::predict_with(&mut rng, 1);
            seen[(p.winning_number - 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
