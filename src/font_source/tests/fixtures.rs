//! Source documents shared by tests across the crate

use crate::font_source::{build, parse, Document};

/// Version 3 document exercising paths, curves, components, an empty
/// layer, a self-referencing component and an associated (non-default)
/// layer.
pub(crate) const GLYPHS3_SOURCE: &str = r#"{
.appVersion = "3208";
.formatVersion = 3;
familyName = "Bubble Test";
unitsPerEm = 1000;
metrics = (
{
type = ascender;
},
{
type = baseline;
},
{
type = descender;
},
{
filter = "script == \"han\"";
type = ascender;
}
);
fontMaster = (
{
id = m01;
name = Regular;
metricValues = (
{
over = 16;
pos = 880;
},
{
over = -16;
},
{
over = -16;
pos = -120;
},
{
pos = 900;
}
);
}
);
glyphs = (
{
glyphname = square;
unicode = 9633;
layers = (
{
layerId = m01;
width = 600;
shapes = (
{
closed = 1;
nodes = (
(100,0,l),
(100,500,l),
(500,500,l),
(500,0,l)
);
}
);
}
);
},
{
glyphname = bump;
layers = (
{
layerId = m01;
width = 400;
shapes = (
{
closed = 1;
nodes = (
(0,0,l),
(0,100,o),
(100,200,o),
(200,200,cs),
(200,0,l)
);
}
);
}
);
},
{
glyphname = squares;
layers = (
{
layerId = m01;
width = 1200;
shapes = (
{
ref = square;
},
{
pos = (600,0);
ref = square;
}
);
}
);
},
{
glyphname = nested;
layers = (
{
layerId = m01;
width = 1300;
shapes = (
{
pos = (100,50);
ref = squares;
}
);
}
);
},
{
glyphname = space;
unicode = 32;
layers = (
{
layerId = m01;
width = 250;
}
);
},
{
glyphname = loop;
layers = (
{
layerId = m01;
width = 100;
shapes = (
{
ref = loop;
}
);
}
);
},
{
glyphname = pingA;
layers = (
{
layerId = m01;
width = 100;
shapes = (
{
ref = pingB;
}
);
}
);
},
{
glyphname = pingB;
layers = (
{
layerId = m01;
width = 100;
shapes = (
{
ref = pingA;
}
);
}
);
},
{
glyphname = orphan;
layers = (
{
layerId = m01;
width = 100;
shapes = (
{
ref = missing;
}
);
}
);
},
{
glyphname = square.alt;
layers = (
{
layerId = m01;
width = 600;
shapes = (
{
closed = 1;
nodes = (
(0,0,l),
(0,600,l),
(600,600,l),
(600,0,l)
);
}
);
},
{
associatedMasterId = m01;
layerId = "B1F3A2C4";
name = "Bracket";
width = 610;
shapes = (
);
}
);
}
);
}
"#;

/// Version 2 document with the same square glyph plus a component
pub(crate) const GLYPHS2_SOURCE: &str = r#"{
familyName = "Bubble Legacy";
unitsPerEm = 1000;
fontMaster = (
{
ascender = 800;
capHeight = 700;
descender = -200;
id = "A1B2-C3";
weight = Bold;
xHeight = 500;
}
);
glyphs = (
{
glyphname = square;
unicode = 25A1;
layers = (
{
layerId = "A1B2-C3";
paths = (
{
closed = 1;
nodes = (
"100 0 LINE",
"100 500 LINE",
"500 500 LINE",
"500 0 LINE"
);
}
);
width = 600;
}
);
},
{
glyphname = squareshift;
unicode = 0041;
layers = (
{
components = (
{
name = square;
transform = "{1, 0, 0, 1, 50, 25}";
}
);
layerId = "A1B2-C3";
width = 650;
}
);
}
);
}
"#;

pub(crate) fn glyphs3_document() -> Document {
    build(&parse(GLYPHS3_SOURCE).expect("fixture parses")).expect("fixture builds")
}

pub(crate) fn glyphs2_document() -> Document {
    build(&parse(GLYPHS2_SOURCE).expect("fixture parses")).expect("fixture builds")
}
