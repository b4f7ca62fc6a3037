use shop_client::reconcile::{reconcile, Edit, EditSummary, Reconcilable};

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    id: u16,
    added: u16,
}

impl Reconcilable for Entry {
    type Key = u16;
    type Added = u16;

    fn key(&self) -> &u16 {
        &self.id
    }

    fn added(&self) -> &u16 {
        &self.added
    }
}

/// Small deterministic generator so failures are reproducible by seed.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

/// Every id gets one fixed `added` value; ties are allowed on purpose.
fn pick_list(rng: &mut Lcg, added_by_id: &[u16]) -> Vec<Entry> {
    let mut list: Vec<Entry> = added_by_id
        .iter()
        .enumerate()
        .filter(|_| rng.below(2) == 0)
        .map(|(id, added)| Entry {
            id: id as u16,
            added: *added,
        })
        .collect();
    list.sort_by_key(|entry| entry.added);
    list
}

fn replay(mut keys: Vec<u16>, edits: &[Edit<u16>]) -> Vec<u16> {
    for edit in edits {
        match edit {
            Edit::Insert { index, key } => keys.insert(*index, *key),
            Edit::Remove { index, key } => {
                assert_eq!(keys[*index], *key, "remove targets the wrong entry");
                keys.remove(*index);
            }
            Edit::Replace { index, key } => assert_eq!(keys[*index], *key),
        }
    }
    keys
}

#[test]
fn converges_is_idempotent_and_edits_replay() {
    for seed in 0..500u64 {
        let mut rng = Lcg(seed);
        let added_by_id: Vec<u16> = (0..12).map(|_| rng.below(8) as u16).collect();
        let original = pick_list(&mut rng, &added_by_id);
        let incoming = pick_list(&mut rng, &added_by_id);
        let expected: Vec<u16> = incoming.iter().map(|entry| entry.id).collect();

        let mut list = original.clone();
        let edits = reconcile(&mut list, incoming.clone());

        let result: Vec<u16> = list.iter().map(|entry| entry.id).collect();
        assert_eq!(result, expected, "seed {seed}: did not converge");
        assert_eq!(
            replay(original.iter().map(|entry| entry.id).collect(), &edits),
            expected,
            "seed {seed}: edits do not replay"
        );
        assert!(
            edits.len() <= original.len() + incoming.len(),
            "seed {seed}: too many edits"
        );

        let second = reconcile(&mut list, incoming);
        assert!(EditSummary::of(&second).is_empty(), "seed {seed}: not idempotent");
    }
}
