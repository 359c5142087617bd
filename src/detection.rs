use serde::{Deserialize, Serialize};

/// Faces found on one image, in the order they were accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub faces: Vec<Face>,
}

/// A face is only ever built once both of its pupils were located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub bounds: FaceBounds,
    pub mouth: Mouth,
    pub left_eye: Eye,
    pub right_eye: Eye,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBounds {
    pub x: i32,
    pub y: i32,
    pub height: i32,
    pub width: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eye {
    pub x: i32,
    pub y: i32,
    pub scale: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mouth {
    pub x: i32,
    pub y: i32,
    pub height: i32,
    pub width: i32,
}

impl FaceDetection {
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn face() -> Face {
        Face {
            bounds: FaceBounds {
                x: 10,
                y: 20,
                height: 100,
                width: 100,
            },
            mouth: Mouth {
                x: 40,
                y: 90,
                height: 4,
                width: 30,
            },
            left_eye: Eye {
                x: 35,
                y: 55,
                scale: 3,
            },
            right_eye: Eye {
                x: 75,
                y: 54,
                scale: 3,
            },
        }
    }

    #[test]
    fn test_wire_field_names() -> Result<()> {
        let detection = FaceDetection {
            faces: vec![face()],
        };

        let json = serde_json::to_value(&detection)?;
        let f = &json["faces"][0];
        assert_eq!(f["bounds"]["x"], 10);
        assert_eq!(f["bounds"]["y"], 20);
        assert_eq!(f["bounds"]["height"], 100);
        assert_eq!(f["bounds"]["width"], 100);
        assert_eq!(f["mouth"]["width"], 30);
        assert_eq!(f["left_eye"]["scale"], 3);
        assert_eq!(f["right_eye"]["x"], 75);
        Ok(())
    }

    #[test]
    fn test_parse_wire_result() -> Result<()> {
        let body = r#"{"faces":[{"bounds":{"x":10,"y":20,"height":100,"width":100},
            "mouth":{"x":40,"y":90,"height":4,"width":30},
            "left_eye":{"x":35,"y":55,"scale":3},
            "right_eye":{"x":75,"y":54,"scale":3}}]}"#;

        let parsed: FaceDetection = serde_json::from_str(body)?;
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.faces[0], face());
        Ok(())
    }
}
