use super::*;

/// Opcode word: word count in the high half, opcode in the low half
const fn op(word_count: u32, opcode: u32) -> u32 {
    (word_count << 16) | opcode
}

/// "main\0" packed little-endian
const MAIN_NAME: [u32; 2] = [0x6E69_616D, 0];

fn header(bound: u32) -> Vec<u32> {
    vec![SPIRV_MAGIC, 0x0001_0000, 0, bound, 0]
}

/// Vertex shader `main` doing nothing, optionally with a uniform block at `binding`
fn module(entry_name: [u32; 2], uniform_binding: Option<u32>) -> Vec<u32> {
    let mut words = header(9);
    words.extend([op(2, 17), 1]); // OpCapability Shader
    words.extend([op(3, 14), 0, 1]); // OpMemoryModel Logical GLSL450
    words.extend([op(5, 15), 0, 3, entry_name[0], entry_name[1]]); // OpEntryPoint Vertex %3
    if let Some(binding) = uniform_binding {
        words.extend([op(4, 71), 6, 34, 0]); // OpDecorate %6 DescriptorSet 0
        words.extend([op(4, 71), 6, 33, binding]); // OpDecorate %6 Binding
        words.extend([op(3, 71), 5, 2]); // OpDecorate %5 Block
        words.extend([op(5, 72), 5, 0, 35, 0]); // OpMemberDecorate %5 0 Offset 0
    }
    words.extend([op(2, 19), 1]); // %1 = OpTypeVoid
    words.extend([op(3, 33), 2, 1]); // %2 = OpTypeFunction %1
    if uniform_binding.is_some() {
        words.extend([op(3, 22), 7, 32]); // %7 = OpTypeFloat 32
        words.extend([op(3, 30), 5, 7]); // %5 = OpTypeStruct %7
        words.extend([op(4, 32), 8, 2, 5]); // %8 = OpTypePointer Uniform %5
        words.extend([op(4, 59), 8, 6, 2]); // %6 = OpVariable %8 Uniform
    }
    words.extend([op(5, 54), 1, 3, 0, 2]); // %3 = OpFunction %1 None %2
    words.extend([op(2, 248), 4]); // %4 = OpLabel
    words.push(op(1, 253)); // OpReturn
    words.push(op(1, 56)); // OpFunctionEnd
    words
}

fn to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

// ============================================================================
// spirv_words
// ============================================================================

#[test]
fn test_spirv_words_rejects_empty() {
    assert!(matches!(spirv_words(&[]), Err(Error::ShaderLoadFailed(_))));
}

#[test]
fn test_spirv_words_rejects_misaligned() {
    let bytes = to_bytes(&header(1));
    let result = spirv_words(&bytes[..bytes.len() - 1]);
    assert!(matches!(result, Err(Error::ShaderLoadFailed(_))));
}

#[test]
fn test_spirv_words_rejects_bad_magic() {
    let bytes = to_bytes(&[0xDEAD_BEEF, 0x0001_0000, 0, 1, 0]);
    assert!(matches!(spirv_words(&bytes), Err(Error::ShaderLoadFailed(_))));
}

#[test]
fn test_spirv_words_decodes_little_endian() {
    let words = module(MAIN_NAME, None);
    assert_eq!(spirv_words(&to_bytes(&words)).unwrap(), words);
}

#[test]
fn test_spirv_words_accepts_byte_swapped_module() {
    let words = module(MAIN_NAME, None);
    let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();
    assert_eq!(spirv_words(&bytes).unwrap(), words);
}

#[test]
fn test_load_spirv_missing_file() {
    let result = load_spirv(Path::new("does/not/exist/default.vert.spv"));
    assert!(matches!(result, Err(Error::ShaderLoadFailed(_))));
}

// ============================================================================
// validate_reflection
// ============================================================================

#[test]
fn test_reflection_accepts_main_without_descriptors() {
    assert!(validate_reflection(&module(MAIN_NAME, None)).is_ok());
}

#[test]
fn test_reflection_accepts_uniform_at_binding_zero() {
    assert!(validate_reflection(&module(MAIN_NAME, Some(0))).is_ok());
}

#[test]
fn test_reflection_rejects_other_binding() {
    let result = validate_reflection(&module(MAIN_NAME, Some(1)));
    assert!(matches!(result, Err(Error::ShaderLoadFailed(_))));
}

#[test]
fn test_reflection_rejects_missing_main() {
    // "mai\0" + padding
    let result = validate_reflection(&module([0x0069_616D, 0], None));
    assert!(matches!(result, Err(Error::ShaderLoadFailed(_))));
}
