use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Community names as they show up in hand-typed survey answers: the same
/// place spelled with and without accents, in different casings.
const COMMUNITIES: &[&[&str]] = &[
    &["Vila Aliança", "vila alianca", "VILA ALIANÇA"],
    &["São José", "Sao Jose", "são josé "],
    &["Jardim Ipê", "jardim ipe"],
    &["Centro"],
];

const PROBLEMS: &[&str] = &[
    "Falta de água",
    "Saneamento",
    "Iluminação pública",
    "Moradia",
    "Acesso à escola",
    "Transporte",
];

const ANSWERED_BY: &[&str] = &["Liderança", "Morador", "Moradora", "Agente de saúde"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform integer in `low..=high`.
    fn range(&mut self, low: i64, high: i64) -> i64 {
        low + (self.next_u64() % (high - low + 1) as u64) as i64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let n_rows = 240;

    let mut community: Vec<&str> = Vec::with_capacity(n_rows);
    let mut problem: Vec<&str> = Vec::with_capacity(n_rows);
    let mut answered_by: Vec<&str> = Vec::with_capacity(n_rows);
    let mut age: Vec<i64> = Vec::with_capacity(n_rows);
    let mut residents: Vec<i64> = Vec::with_capacity(n_rows);
    let mut notes: Vec<Option<String>> = Vec::with_capacity(n_rows);

    for row in 0..n_rows {
        let spellings = COMMUNITIES[row % COMMUNITIES.len()];
        community.push(rng.pick(spellings));
        problem.push(rng.pick(PROBLEMS));
        answered_by.push(rng.pick(ANSWERED_BY));
        age.push(rng.range(16, 80));
        residents.push(rng.range(1, 9));
        // Most answers leave the free-text note blank.
        notes.push((rng.range(0, 4) == 0).then(|| format!("Visita {}", row + 1)));
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Comunidade", DataType::Utf8, false),
        Field::new("Problema", DataType::Utf8, false),
        Field::new("Respondente", DataType::Utf8, false),
        Field::new("Idade", DataType::Int64, false),
        Field::new("Moradores", DataType::Int64, false),
        Field::new("Observações", DataType::Utf8, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(community)),
            Arc::new(StringArray::from(problem)),
            Arc::new(StringArray::from(answered_by)),
            Arc::new(Int64Array::from(age)),
            Arc::new(Int64Array::from(residents)),
            Arc::new(StringArray::from(notes)),
        ],
    )?;

    // Write Parquet
    let output_path = "sample_survey.parquet";
    let file = std::fs::File::create(output_path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    log::info!("wrote {n_rows} survey answers to {output_path}");
    println!("Wrote {n_rows} survey answers to {output_path}");
    Ok(())
}
