//! Instruction decoding: form classification, operand types, and the
//! store/branch/text trailers.

use crate::memory::Memory;
use crate::text;
use std::fmt::{self, Display, Write};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperandType {
    LargeConstant,
    SmallConstant,
    Variable,
    Omitted,
}

impl OperandType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => OperandType::LargeConstant,
            0b01 => OperandType::SmallConstant,
            0b10 => OperandType::Variable,
            _ => OperandType::Omitted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstructionForm {
    Long,
    Short,
    Extended,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperandCount {
    OP0,
    OP1,
    OP2,
    VAR,
}

#[derive(Debug, Clone)]
pub struct BranchInfo {
    pub on_true: bool,
    /// 0/1 mean return false/true, 2+ is a PC-relative jump offset.
    pub offset: i16,
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: u8,
    pub ext_opcode: Option<u8>,
    pub form: InstructionForm,
    pub operand_count: OperandCount,
    pub operand_types: Vec<OperandType>,
    pub operands: Vec<u16>,
    pub store_var: Option<u8>,
    pub branch: Option<BranchInfo>,
    pub text: Option<String>,
    pub size: usize,
}

impl Instruction {
    pub fn decode(memory: &Memory, addr: u32, version: u8) -> Result<Self, String> {
        let bytes = memory.as_slice();
        let addr = addr as usize;
        if addr >= bytes.len() {
            return Err(format!("instruction address {addr:#06x} out of bounds"));
        }

        let mut offset = addr;
        let opcode_byte = bytes[offset];
        offset += 1;

        let form = match opcode_byte >> 6 {
            0b11 => InstructionForm::Variable,
            0b10 => InstructionForm::Short,
            0b01 => InstructionForm::Long,
            _ => {
                if opcode_byte == 0xBE && version >= 5 {
                    InstructionForm::Extended
                } else {
                    InstructionForm::Long
                }
            }
        };

        let (opcode, ext_opcode, operand_count) = match form {
            InstructionForm::Long => {
                let opcode = opcode_byte & 0x1F;
                if opcode == 0x00 {
                    return Err(format!("invalid Long form opcode 0x00 at {addr:#06x}"));
                }
                (opcode, None, OperandCount::OP2)
            }
            InstructionForm::Short => {
                let op_count = if (opcode_byte >> 4) & 0x03 == 0x03 {
                    OperandCount::OP0
                } else {
                    OperandCount::OP1
                };
                (opcode_byte & 0x0F, None, op_count)
            }
            InstructionForm::Variable => {
                let op_count = if opcode_byte & 0x20 == 0 {
                    OperandCount::OP2
                } else {
                    OperandCount::VAR
                };
                (opcode_byte & 0x1F, None, op_count)
            }
            InstructionForm::Extended => {
                if offset >= bytes.len() {
                    return Err("extended opcode out of bounds".to_string());
                }
                let ext_op = bytes[offset];
                offset += 1;
                (opcode_byte, Some(ext_op), OperandCount::VAR)
            }
        };

        let mut operand_types = Vec::new();
        match form {
            InstructionForm::Long => {
                let type1 = if opcode_byte & 0x40 != 0 {
                    OperandType::Variable
                } else {
                    OperandType::SmallConstant
                };
                let type2 = if opcode_byte & 0x20 != 0 {
                    OperandType::Variable
                } else {
                    OperandType::SmallConstant
                };
                operand_types.push(type1);
                operand_types.push(type2);
            }
            InstructionForm::Short => {
                if operand_count != OperandCount::OP0 {
                    let op_type = OperandType::from_bits((opcode_byte >> 4) & 0x03);
                    if op_type != OperandType::Omitted {
                        operand_types.push(op_type);
                    }
                }
            }
            InstructionForm::Variable | InstructionForm::Extended => {
                if offset >= bytes.len() {
                    return Err("operand types out of bounds".to_string());
                }
                let mut type_bytes = vec![bytes[offset]];
                offset += 1;
                if operand_count == OperandCount::VAR && (opcode == 12 || opcode == 26) {
                    if offset >= bytes.len() {
                        return Err("extended operand types out of bounds".to_string());
                    }
                    type_bytes.push(bytes[offset]);
                    offset += 1;
                }
                for type_byte in type_bytes {
                    for i in 0..4 {
                        let op_type = OperandType::from_bits(type_byte >> (6 - i * 2));
                        if op_type == OperandType::Omitted {
                            break;
                        }
                        operand_types.push(op_type);
                    }
                }
            }
        };

        let expected_count = crate::opcode_tables::get_expected_operand_count(
            opcode,
            ext_opcode,
            form,
            operand_count,
            version,
        );
        let operand_limit = match expected_count {
            Some(count) => operand_types.len().min(count),
            None => operand_types.len(),
        };

        let mut operands = Vec::new();
        for (i, op_type) in operand_types.iter().enumerate() {
            if i >= operand_limit {
                break;
            }
            match op_type {
                OperandType::LargeConstant => {
                    if offset + 1 >= bytes.len() {
                        return Err("large constant out of bounds".to_string());
                    }
                    operands.push(((bytes[offset] as u16) << 8) | bytes[offset + 1] as u16);
                    offset += 2;
                }
                OperandType::SmallConstant | OperandType::Variable => {
                    if offset >= bytes.len() {
                        return Err("small constant/variable out of bounds".to_string());
                    }
                    operands.push(bytes[offset] as u16);
                    offset += 1;
                }
                OperandType::Omitted => break,
            }
        }

        let store_var = if Self::stores_result(opcode, ext_opcode, form, operand_count, version) {
            if offset >= bytes.len() {
                return Err("store variable out of bounds".to_string());
            }
            let var = bytes[offset];
            offset += 1;
            Some(var)
        } else {
            None
        };

        let branch = if Self::has_branch(opcode, ext_opcode, form, operand_count, version) {
            if offset >= bytes.len() {
                return Err("branch offset out of bounds".to_string());
            }
            let first_byte = bytes[offset];
            offset += 1;
            let on_true = (first_byte & 0x80) != 0;
            let offset_val = if (first_byte & 0x40) != 0 {
                (first_byte & 0x3F) as i16
            } else {
                if offset >= bytes.len() {
                    return Err("branch offset second byte out of bounds".to_string());
                }
                let second_byte = bytes[offset];
                offset += 1;
                let val = (((first_byte & 0x3F) as i16) << 8) | (second_byte as i16);
                if val & 0x2000 != 0 {
                    val | (0xC000u16 as i16)
                } else {
                    val
                }
            };
            Some(BranchInfo { on_true, offset: offset_val })
        } else {
            None
        };

        let text = if Self::has_text(opcode, ext_opcode, form, operand_count, version) {
            match text::decode_string(memory, offset as u32) {
                Ok((string, len)) => {
                    offset += len as usize;
                    Some(string)
                }
                Err(e) => return Err(format!("failed to decode inline text: {e}")),
            }
        } else {
            None
        };

        let size = offset - addr;
        let mut actual_operand_types = operand_types;
        actual_operand_types.truncate(operands.len());

        Ok(Instruction {
            opcode,
            ext_opcode,
            form,
            operand_count,
            operand_types: actual_operand_types,
            operands,
            store_var,
            branch,
            text,
            size,
        })
    }

    fn stores_result(
        opcode: u8,
        ext_opcode: Option<u8>,
        form: InstructionForm,
        operand_count: OperandCount,
        version: u8,
    ) -> bool {
        crate::opcode_tables::stores_result(opcode, ext_opcode, form, operand_count, version)
    }

    fn has_branch(
        opcode: u8,
        ext_opcode: Option<u8>,
        form: InstructionForm,
        operand_count: OperandCount,
        version: u8,
    ) -> bool {
        crate::opcode_tables::has_branch(opcode, ext_opcode, form, operand_count, version)
    }

    fn has_text(
        opcode: u8,
        ext_opcode: Option<u8>,
        form: InstructionForm,
        operand_count: OperandCount,
        version: u8,
    ) -> bool {
        crate::opcode_tables::has_text(opcode, ext_opcode, form, operand_count, version)
    }

    pub fn name(&self, version: u8) -> &'static str {
        crate::opcode_tables::get_instruction_name(
            self.opcode,
            self.ext_opcode,
            self.form,
            self.operand_count,
            version,
        )
    }

    pub fn format_with_version(&self, version: u8) -> String {
        let mut result = String::from(self.name(version));
        for (i, op) in self.operands.iter().enumerate() {
            if i == 0 {
                result.push(' ');
            } else {
                result.push_str(", ");
            }
            match self.operand_types.get(i) {
                Some(OperandType::Variable) => write!(result, "V{op:02x}").unwrap(),
                _ => write!(result, "#{op:04x}").unwrap(),
            }
        }
        if let Some(var) = self.store_var {
            write!(result, " -> V{var:02x}").unwrap();
        }
        if let Some(ref branch) = self.branch {
            write!(
                result,
                " [{}{}]",
                if branch.on_true { "TRUE" } else { "FALSE" },
                match branch.offset {
                    0 => " RFALSE".to_string(),
                    1 => " RTRUE".to_string(),
                    n => format!(" {n:+}"),
                }
            )
            .unwrap();
        }
        result
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_with_version(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_from(bytes: Vec<u8>) -> Memory {
        let mut bytes = bytes;
        if bytes.len() < 64 {
            bytes.resize(64, 0);
        }
        bytes[0] = 3;
        bytes[0x0E] = 0x00;
        bytes[0x0F] = 0x40;
        Memory::load(bytes).unwrap()
    }

    #[test]
    fn operand_type_from_bits() {
        assert_eq!(OperandType::from_bits(0b00), OperandType::LargeConstant);
        assert_eq!(OperandType::from_bits(0b01), OperandType::SmallConstant);
        assert_eq!(OperandType::from_bits(0b10), OperandType::Variable);
        assert_eq!(OperandType::from_bits(0b11), OperandType::Omitted);
    }

    #[test]
    fn decodes_long_form_je() {
        let mem = memory_from(vec![0x41, 0x34, 0x78, 0x80, 0x00, 0x00]);
        let inst = Instruction::decode(&mem, 0, 3).unwrap();
        assert_eq!(inst.form, InstructionForm::Long);
        assert_eq!(inst.opcode, 0x01);
        assert_eq!(inst.operands, vec![0x34, 0x78]);
        assert!(inst.branch.is_some());
    }

    #[test]
    fn decodes_short_form_jump() {
        let mem = memory_from(vec![0x9C, 0x34, 0x00, 0x00]);
        let inst = Instruction::decode(&mem, 0, 3).unwrap();
        assert_eq!(inst.form, InstructionForm::Short);
        assert_eq!(inst.opcode, 0x0C);
        assert_eq!(inst.operands, vec![0x34]);
    }

    #[test]
    fn decodes_variable_form_call() {
        let mem = memory_from(vec![
            0xE0, 0x2A, 0x12, 0x34, 0x01, 0x02, 0x03, 0x00, 0x00, 0x00,
        ]);
        let inst = Instruction::decode(&mem, 0, 3).unwrap();
        assert_eq!(inst.form, InstructionForm::Variable);
        assert_eq!(inst.operands, vec![0x1234, 0x01, 0x02, 0x03]);
        assert_eq!(inst.store_var, Some(0x00));
    }
}
