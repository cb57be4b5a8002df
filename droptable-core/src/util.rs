use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    (0..length).map(|_| rng.sample(Alphanumeric) as char).collect()
}
