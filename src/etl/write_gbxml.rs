use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use log::info;

use crate::config::UserConfig;
use crate::data::Building;
use crate::errors::Result;
use crate::etl::parse_osm;
use crate::gbxml::{self, Conversion, GbXmlOptions};

use super::Etl;

pub const ETL_NAME: &str = "write_gbxml";
pub const OUTPUT_FILE_NAME: &str = "model.xml";

pub struct WriteGbXmlEtl {
    options: GbXmlOptions,
    space_count: Option<usize>,
}

impl WriteGbXmlEtl {
    pub fn new(config: &UserConfig) -> WriteGbXmlEtl {
        WriteGbXmlEtl {
            options: config.gbxml_options(),
            space_count: None,
        }
    }

    /// Spaces written by the last run, `None` if the output came from the cache.
    pub fn space_count(&self) -> Option<usize> {
        self.space_count
    }
}

impl Etl for WriteGbXmlEtl {
    type Input = Vec<Building>;
    type Output = Conversion;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn output_file_name(&self) -> &str {
        OUTPUT_FILE_NAME
    }

    fn extract(&mut self, dir: &Path) -> Result<Self::Input> {
        let input_file = File::open(dir.join(parse_osm::OUTPUT_FILE_NAME))?;
        Ok(serde_json::from_reader(BufReader::new(input_file))?)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        gbxml::build(&input, &self.options)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        self.space_count = Some(output.space_count);
        match output.xml {
            Some(xml) => fs::write(dir.join(OUTPUT_FILE_NAME), xml)?,
            None => info!(etl_name = ETL_NAME; "No buildings, nothing written"),
        }
        Ok(())
    }
}
