use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing multi-frame structure files.
///
/// A structure file is a sequence of frames, each describing one geometry. Formats
/// such as XYZ allow frames to be appended one after another, which is how optimizer
/// trajectories are recorded.
pub trait StructureFile {
    /// A single geometry as stored in the file.
    type Frame;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads every frame from a buffered reader, in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Self::Frame>, Self::Error>;

    /// Writes one frame to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(frame: &Self::Frame, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads every frame from a file path.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Self::Frame>, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes one frame to a file path, truncating any existing content.
    fn write_to_path<P: AsRef<Path>>(frame: &Self::Frame, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(frame, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Appends one frame to a file path, creating the file if it does not exist.
    fn append_to_path<P: AsRef<Path>>(frame: &Self::Frame, path: P) -> Result<(), Self::Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(frame, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
