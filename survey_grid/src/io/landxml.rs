//! LandXML TIN surface export.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::dtm::Tin;

/// Writes a [`Tin`] to a LandXML surface file. Point and face ids are
/// 1-based as LandXML requires.
pub fn write_landxml_surface(path: &Path, tin: &Tin, name: &str) -> io::Result<()> {
    let mut xml = BufWriter::new(File::create(path)?);
    writeln!(xml, "<?xml version=\"1.0\"?>")?;
    writeln!(xml, "<LandXML>")?;
    writeln!(xml, "  <Surfaces>")?;
    writeln!(xml, "    <Surface name=\"{}\">", escape(name))?;
    writeln!(xml, "      <Definition surfType=\"TIN\">")?;
    writeln!(xml, "        <Pnts>")?;
    for (i, v) in tin.vertices.iter().enumerate() {
        // LandXML stores northing before easting
        writeln!(xml, "          <P id=\"{}\">{} {} {}</P>", i + 1, v.y, v.x, v.z)?;
    }
    writeln!(xml, "        </Pnts>")?;
    writeln!(xml, "        <Faces>")?;
    for t in &tin.triangles {
        writeln!(xml, "          <F>{} {} {}</F>", t[0] + 1, t[1] + 1, t[2] + 1)?;
    }
    writeln!(xml, "        </Faces>")?;
    writeln!(xml, "      </Definition>")?;
    writeln!(xml, "    </Surface>")?;
    writeln!(xml, "  </Surfaces>")?;
    writeln!(xml, "</LandXML>")?;
    xml.flush()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
