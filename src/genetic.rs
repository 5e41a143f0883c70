//! Genetic operators for the HGS-CVRP algorithm.

use crate::individual::Individual;
use rand::Rng;

/// Implements the crossover operator of the HGS-CVRP.
pub struct Genetic;

impl Genetic {
    /// Perform ordered crossover (OX) between the giant tours of two parents.
    ///
    /// A circular slice of the first parent is kept in place; the remaining
    /// positions are filled, starting after the slice, with the clients of
    /// the second parent in their order, starting after the slice as well.
    pub fn crossover_ox<R: Rng + ?Sized>(
        &self,
        parent1: &Individual,
        parent2: &Individual,
        rng: &mut R,
    ) -> Vec<usize> {
        let p1_tour = &parent1.giant_tour;
        let p2_tour = &parent2.giant_tour;
        let tour_size = p1_tour.len();

        if tour_size < 2 || p2_tour.len() != tour_size {
            return p1_tour.clone();
        }

        // Step 1: Pick two distinct cutting points
        let start = rng.gen_range(0..tour_size);
        let mut end = rng.gen_range(0..tour_size);
        while end == start {
            end = rng.gen_range(0..tour_size);
        }

        // Step 2: Copy the slice from start to end (circular) from the first parent
        let mut offspring_tour = vec![0; tour_size];
        let mut used = vec![false; tour_size + 1];
        let mut j = start;
        while j % tour_size != (end + 1) % tour_size {
            let client = p1_tour[j % tour_size];
            offspring_tour[j % tour_size] = client;
            used[client] = true;
            j += 1;
        }

        // Step 3: Fill remaining positions in the order of the second parent
        for i in 1..=tour_size {
            let client = p2_tour[(end + i) % tour_size];
            if !used[client] {
                offspring_tour[j % tour_size] = client;
                j += 1;
            }
        }

        offspring_tour
    }
}
