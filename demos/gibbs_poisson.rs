//! Provides an example of a Gibbs sweep with the herald operators: inferring
//! a Poisson rate from observed event counts.
//!
//! With the counts observed the rate's full conditional is conjugate, so the
//! sweep alternates exact draws of the rate and posterior-predictive draws of
//! the next count. The running mean of the rate draws is compared against the
//! closed-form posterior mean at the end.

use herald::distributions::{ExponentialFamily, Gamma};
use herald::factors::poisson;

fn main() -> herald::Result<()> {
    env_logger::init();

    /////////////////////////////////////////////////////
    // Step 1: the model
    //   rate ~ Gamma(2, 1)
    //   count_i ~ Poisson(rate)
    let prior = Gamma::new(2.0, 1.0);
    let counts: [u64; 6] = [3, 5, 4, 2, 6, 4];

    /////////////////////////////////////////////////////
    // Step 2: the exact posterior and evidence, by message passing
    let mut belief = prior;
    let mut log_evidence = 0.0;
    for &count in &counts {
        // chain rule: each factor's average under the belief so far
        log_evidence += poisson::log_average_factor(count, &belief)?;
        belief = belief.product(&poisson::to_rate_observed(count))?;
    }

    /////////////////////////////////////////////////////
    // Step 3: Gibbs sweeps against the same model
    let mut rng = rand::thread_rng();
    let burnin = 1_000;
    let sweeps = 10_000;

    let total: u64 = counts.iter().sum();
    let conditional = Gamma::new(
        prior.shape() + total as f64,
        prior.rate() + counts.len() as f64,
    );

    let mut rate_sum = 0.0;
    let mut predictive_sum = 0.0;
    for sweep in 0..(burnin + sweeps) {
        let rate = conditional.sample(&mut rng)?;
        let next_count = poisson::sample_count(&mut rng, rate)?;

        if sweep >= burnin {
            rate_sum += rate;
            predictive_sum += next_count as f64;
        }
    }

    /////////////////////////////////////////////////////
    // Step 4: report
    println!(
        "posterior rate: Gibbs mean {:.4}, exact mean {:.4}",
        rate_sum / sweeps as f64,
        belief.mean()?
    );
    println!(
        "posterior predictive count: Gibbs mean {:.4}, exact mean {:.4}",
        predictive_sum / sweeps as f64,
        poisson::to_count(&belief)?.mean()?
    );
    println!("log evidence: {:.4}", log_evidence);

    Ok(())
}
