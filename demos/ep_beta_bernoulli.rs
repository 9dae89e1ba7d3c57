//! Provides an example of hand-driving an Expectation Propagation loop with
//! the herald operators: inferring a coin's bias from noisy observations of
//! its flips.
//!
//! Each flip is seen through a noisy channel that reports the truth with
//! probability 0.9. The posterior over the bias is exact conjugate updating
//! only when the flips are observed directly; with the channel in between,
//! EP iterates sites to a fixed point.

use herald::distributions::{Bernoulli, Beta, ExponentialFamily};
use herald::factors::{bernoulli_from_beta, BernoulliFromBool};

fn main() -> herald::Result<()> {
    env_logger::init();

    /////////////////////////////////////////////////////
    // Step 1: the model
    //   bias ~ Beta(1, 1)
    //   flip_i ~ Bernoulli(bias)
    //   report_i ~ flip_i ? Bernoulli(0.9) : Bernoulli(0.1)
    let prior = Beta::uniform();
    let channel = BernoulliFromBool::new(0.9, 0.1)?;
    let reports = [true, true, false, true, true, true, false, true];

    /////////////////////////////////////////////////////
    // Step 2: fold the channel into a message per flip
    let flip_beliefs: Vec<Bernoulli> = reports
        .iter()
        .map(|&r| {
            let observed = Bernoulli::point_mass(r);
            channel.to_choice(&observed)
        })
        .collect::<herald::Result<_>>()?;

    /////////////////////////////////////////////////////
    // Step 3: iterate EP sites for the bias
    let mut sites = vec![Beta::uniform(); reports.len()];

    for sweep in 0..20 {
        let mut max_shift = 0.0f64;
        for (i, flip) in flip_beliefs.iter().enumerate() {
            // cavity: the posterior with this site removed
            let mut cavity = prior;
            for (j, site) in sites.iter().enumerate() {
                if j != i {
                    cavity = cavity.product(site)?;
                }
            }

            let new_site = bernoulli_from_beta::to_prob(flip, &cavity)?;
            let shift = (new_site.true_count() - sites[i].true_count()).abs()
                + (new_site.false_count() - sites[i].false_count()).abs();
            max_shift = max_shift.max(shift);
            sites[i] = new_site;
        }

        if max_shift < 1e-10 {
            println!("converged after {} sweeps", sweep + 1);
            break;
        }
    }

    /////////////////////////////////////////////////////
    // Step 4: read out the posterior and the evidence
    let mut posterior = prior;
    for site in &sites {
        posterior = posterior.product(site)?;
    }

    println!(
        "posterior bias: mean {:.4}, sd {:.4}",
        posterior.mean()?,
        posterior.variance()?.sqrt()
    );

    let mut log_evidence = 0.0;
    for (flip, site) in flip_beliefs.iter().zip(sites.iter()) {
        let cavity = posterior.ratio(site)?;
        log_evidence += bernoulli_from_beta::log_average_factor(flip, &cavity)?;
    }
    println!("log evidence estimate: {:.4}", log_evidence);

    Ok(())
}
